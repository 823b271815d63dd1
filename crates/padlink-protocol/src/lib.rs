//! WebSocket transport layer and wire protocol for padlink.
//!
//! This crate handles WebSocket connection management (via
//! tokio-tungstenite) and message serialisation/deserialisation (JSON text
//! frames via serde_json). Decoding is deliberately separate from frame
//! receipt so that a malformed payload is a per-message error the session
//! loop can recover from, not a connection error.

pub mod connection;
pub mod error;
pub mod transport;
pub mod wire;

pub use connection::{ClientConnection, MessageReceiver, MessageSender};
pub use error::ProtocolError;
pub use transport::WsTransport;
