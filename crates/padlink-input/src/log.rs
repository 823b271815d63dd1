//! Logging fallback sink.

use async_trait::async_trait;
use padlink_types::{ClientId, TargetFrame};
use tracing::debug;

use crate::error::SinkError;
use crate::InputSink;

/// A sink that logs frames instead of injecting them.
///
/// Used on platforms without a real backend, and handy when running the
/// relay just to exercise the protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl InputSink for LogSink {
    async fn deliver(&self, client: ClientId, frame: &TargetFrame) -> Result<(), SinkError> {
        debug!(client = %client, ?frame, "dropping frame (log sink)");
        Ok(())
    }
}
