//! Protocol and transport errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("serialisation error: {0}")]
    Serialization(String),

    #[error("deserialisation error: {0}")]
    Deserialization(String),

    #[error("message size {len} exceeds maximum {max}")]
    MessageTooLarge { len: usize, max: usize },

    #[error("connection closed unexpectedly")]
    StreamClosed,

    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
