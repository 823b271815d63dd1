//! Per-connection session loop: registration, message dispatch, cleanup.

use std::net::SocketAddr;
use std::sync::Arc;

use padlink_protocol::{wire, ClientConnection, MessageReceiver, ProtocolError};
use padlink_types::{translate, ClientId, ClientMessage, ControlCommand, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::daemon::Relay;
use crate::process::{ProcessError, StartOutcome, StopOutcome};
use crate::state::ConnectionState;

/// One client's connection, from registration to guaranteed cleanup.
pub struct ClientSession {
    relay: Arc<Relay>,
    remote: SocketAddr,
    state: ConnectionState,
}

impl ClientSession {
    pub fn new(relay: Arc<Relay>, remote: SocketAddr) -> Self {
        Self {
            relay,
            remote,
            state: ConnectionState::Connecting,
        }
    }

    /// Drive the connection until it closes.
    ///
    /// Every exit path — clean close, transport error, writer hangup —
    /// funnels through the single deregistration at the bottom. A session
    /// that never registers (capacity rejection) leaves no trace to clean
    /// up.
    pub async fn run(&mut self, conn: ClientConnection) {
        let (mut tx, mut rx) = conn.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

        let id = match self.relay.registry.register(outbound_tx) {
            Ok(id) => id,
            Err(_full) => {
                warn!(remote = %self.remote, "connection refused: too many clients");
                let _ = tx.send(&ServerMessage::error("Too many clients")).await;
                let _ = tx.close().await;
                self.state = ConnectionState::Closed;
                return;
            }
        };

        info!(remote = %self.remote, client = %id, "client connected");
        self.state = ConnectionState::Active;

        // All outbound traffic for this session funnels through one
        // channel, so replies and broadcasts keep their relative order.
        self.relay.registry.send_to(id, ServerMessage::welcome(id));
        let writer = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                if tx.send(&msg).await.is_err() {
                    break;
                }
            }
            let _ = tx.close().await;
        });

        if let Err(e) = self.read_loop(id, &mut rx).await {
            debug!(client = %id, error = %e, "connection error");
        }

        // Guaranteed cleanup, regardless of which path exited the loop.
        self.relay.registry.deregister(id);
        if let Err(e) = self.relay.sink.release(id).await {
            debug!(client = %id, error = %e, "sink release failed");
        }
        self.state = ConnectionState::Closed;

        // Deregistration dropped the last sender, so the writer drains
        // whatever is queued and exits on its own.
        let _ = writer.await;
        info!(client = %id, "client disconnected");
    }

    async fn read_loop(
        &mut self,
        id: ClientId,
        rx: &mut MessageReceiver,
    ) -> Result<(), ProtocolError> {
        while let Some(text) = rx.recv_text().await? {
            match wire::decode_message::<ClientMessage>(&text) {
                Ok(msg) => self.dispatch(id, msg).await,
                // Malformed payloads are a per-message problem; the
                // connection stays up.
                Err(e) => warn!(client = %id, error = %e, "ignoring malformed message"),
            }
        }
        Ok(())
    }

    async fn dispatch(&self, id: ClientId, msg: ClientMessage) {
        match msg {
            ClientMessage::ControllerInput { input, .. } => {
                let frame = translate(&input);
                if frame.is_empty() {
                    return;
                }
                // Best-effort: a dropped frame never breaks the session.
                if let Err(e) = self.relay.sink.deliver(id, &frame).await {
                    warn!(client = %id, error = %e, "failed to deliver input frame");
                }
            }
            ClientMessage::Control { command } => self.handle_command(id, command).await,
        }
    }

    async fn handle_command(&self, id: ClientId, command: ControlCommand) {
        match command {
            ControlCommand::StartDolphin => match self.relay.process.start().await {
                Ok(StartOutcome::Launched | StartOutcome::AlreadyRunning) => {}
                Err(e) => {
                    error!(client = %id, error = %e, "start failed");
                    self.relay
                        .registry
                        .broadcast(&ServerMessage::error(start_failure_reason(&e)));
                }
            },
            ControlCommand::StopDolphin => match self.relay.process.stop().await {
                Ok(StopOutcome::Stopped | StopOutcome::NotRunning) => {}
                Err(e) => {
                    error!(client = %id, error = %e, "stop failed");
                    self.relay
                        .registry
                        .broadcast(&ServerMessage::error(format!("Failed to stop Dolphin: {e}")));
                }
            },
            ControlCommand::Status => {
                // Status goes to the requester only, never broadcast.
                let status = self.relay.process.status().await;
                self.relay.registry.send_to(id, ServerMessage::Status { status });
            }
        }
    }

    /// The connection's current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

/// The user-facing reason broadcast when a start fails.
fn start_failure_reason(err: &ProcessError) -> String {
    match err {
        ProcessError::ExecutableNotFound(_) => "Dolphin executable not found".to_string(),
        // Launch's own Display already says "failed to launch"; report the
        // underlying cause instead of stacking prefixes.
        ProcessError::Launch(source) => format!("Failed to start Dolphin: {source}"),
        other => format!("Failed to start Dolphin: {other}"),
    }
}
