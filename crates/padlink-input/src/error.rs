//! Input sink errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no free controller slot (all {0} in use)")]
    SlotsExhausted(usize),

    #[error("failed to write to input pipe: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend not available on this platform")]
    Unavailable,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
