//! Daemon orchestration: shared context and the accept loop.

use std::sync::Arc;

use padlink_input::InputSink;
use padlink_protocol::WsTransport;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::DaemonError;
use crate::process::ProcessController;
use crate::registry::SessionRegistry;
use crate::session::ClientSession;

/// Shared context injected into every connection task.
///
/// This is the process-wide mutable state — the client registry and the
/// single emulator handle — made explicit instead of ambient globals.
pub struct Relay {
    pub registry: SessionRegistry,
    pub process: ProcessController,
    pub sink: Box<dyn InputSink>,
}

/// The padlink relay daemon.
pub struct Daemon {
    config: Config,
    relay: Arc<Relay>,
}

impl Daemon {
    /// Build a daemon from configuration and a platform sink.
    pub fn new(config: Config, sink: Box<dyn InputSink>) -> Self {
        let relay = Arc::new(Relay {
            registry: SessionRegistry::new(config.daemon.max_clients),
            process: ProcessController::new(&config.emulator),
            sink,
        });
        Self { config, relay }
    }

    /// The shared context (exposed for integration tests).
    pub fn relay(&self) -> Arc<Relay> {
        Arc::clone(&self.relay)
    }

    /// Bind the configured address and serve until interrupted.
    pub async fn run(&self) -> Result<(), DaemonError> {
        let addr = self.config.daemon.listen_addr()?;
        let transport = WsTransport::bind(addr).await?;
        self.serve(transport).await
    }

    /// Serve connections on an already-bound transport.
    pub async fn serve(&self, transport: WsTransport) -> Result<(), DaemonError> {
        let addr = transport.local_addr()?;
        info!(
            addr = %addr,
            max_clients = self.config.daemon.max_clients,
            "relay listening"
        );

        if self.relay.process.query_running().await {
            info!("Dolphin is already running on startup");
        }

        loop {
            tokio::select! {
                result = transport.accept() => match result {
                    Ok(conn) => {
                        let remote = conn.remote_address();
                        let mut session = ClientSession::new(Arc::clone(&self.relay), remote);
                        tokio::spawn(async move { session.run(conn).await });
                    }
                    Err(e) => {
                        debug!(error = %e, "accept error");
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
