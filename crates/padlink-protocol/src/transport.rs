//! WebSocket transport: bind and accept.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::connection::ClientConnection;
use crate::error::ProtocolError;

/// WebSocket server transport for padlink.
///
/// Wraps a TCP listener; each accepted connection goes through the
/// WebSocket upgrade handshake before being handed to a session task.
pub struct WsTransport {
    listener: TcpListener,
}

impl WsTransport {
    /// Bind the listening socket.
    pub async fn bind(addr: SocketAddr) -> Result<Self, ProtocolError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ProtocolError::Connection(e.to_string()))?;
        info!(addr = %addr, "WebSocket transport bound");
        Ok(Self { listener })
    }

    /// Accept an incoming connection and perform the WebSocket handshake.
    pub async fn accept(&self) -> Result<ClientConnection, ProtocolError> {
        let (stream, remote) = self
            .listener
            .accept()
            .await
            .map_err(|e| ProtocolError::Connection(e.to_string()))?;

        let conn = ClientConnection::accept(stream, remote).await?;
        debug!(remote = %remote, "accepted connection");
        Ok(conn)
    }

    /// Get the local address this transport is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ProtocolError> {
        self.listener
            .local_addr()
            .map_err(|e| ProtocolError::Connection(e.to_string()))
    }
}
