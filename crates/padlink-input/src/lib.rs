//! Platform-abstracted controller input injection for padlink.
//!
//! This crate defines the [`InputSink`] trait that platform-specific
//! backends implement. The pipe backend (Linux, Dolphin's pipe-input
//! protocol) lives behind the `linux` feature; the recording mock for
//! tests lives behind `mock`. [`LogSink`] is always available as a
//! fallback that only logs.
//!
//! Delivery is best-effort by contract: callers log a failed frame and
//! carry on — a dropped frame must never take a session down.

use async_trait::async_trait;
use padlink_types::{ClientId, TargetFrame};

pub mod error;
pub mod log;
#[cfg(feature = "mock")]
pub mod mock;
#[cfg(all(feature = "linux", unix))]
pub mod pipe;

pub use error::SinkError;
pub use log::LogSink;

/// Delivers translated input frames to the emulator.
///
/// The `client` identity is threaded through so a backend can hold one
/// controller slot per connected client (one per player).
#[async_trait]
pub trait InputSink: Send + Sync + 'static {
    /// Deliver one translated frame on behalf of `client`.
    async fn deliver(&self, client: ClientId, frame: &TargetFrame) -> Result<(), SinkError>;

    /// Release any per-client resources (e.g. a controller slot).
    ///
    /// Called when the client's session ends. Idempotent; the default
    /// implementation does nothing.
    async fn release(&self, _client: ClientId) -> Result<(), SinkError> {
        Ok(())
    }
}
