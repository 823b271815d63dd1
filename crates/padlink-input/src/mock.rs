//! Mock input sink for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use padlink_types::{ClientId, TargetFrame};

use crate::error::SinkError;
use crate::InputSink;

/// A frame recorded by [`MockSink`] for test observation.
#[derive(Debug, Clone)]
pub struct DeliveredFrame {
    pub client: ClientId,
    pub frame: TargetFrame,
}

#[derive(Debug, Default)]
struct MockSinkState {
    delivered: Vec<DeliveredFrame>,
    released: Vec<ClientId>,
    fail: bool,
}

/// Mock input sink backend for testing.
///
/// Records every delivered frame and released client; can be switched
/// into a failing mode to verify that sink errors never break a session.
#[derive(Default)]
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSink {
    /// Create a new mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clonable handle for observing the sink state from tests.
    pub fn handle(&self) -> MockSinkHandle {
        MockSinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for [`MockSink`].
#[derive(Clone)]
pub struct MockSinkHandle {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSinkHandle {
    /// Snapshot of every frame delivered so far, in order.
    pub fn delivered(&self) -> Vec<DeliveredFrame> {
        self.state.lock().unwrap().delivered.clone()
    }

    /// Frames delivered on behalf of one client, in order.
    pub fn frames_for(&self, client: ClientId) -> Vec<TargetFrame> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .iter()
            .filter(|d| d.client == client)
            .map(|d| d.frame.clone())
            .collect()
    }

    /// Clients released so far.
    pub fn released(&self) -> Vec<ClientId> {
        self.state.lock().unwrap().released.clone()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }
}

#[async_trait]
impl InputSink for MockSink {
    async fn deliver(&self, client: ClientId, frame: &TargetFrame) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(SinkError::Unavailable);
        }
        state.delivered.push(DeliveredFrame {
            client,
            frame: frame.clone(),
        });
        Ok(())
    }

    async fn release(&self, client: ClientId) -> Result<(), SinkError> {
        self.state.lock().unwrap().released.push(client);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padlink_types::InputValue;

    #[tokio::test]
    async fn records_deliveries_per_client() {
        let sink = MockSink::new();
        let handle = sink.handle();
        let a = ClientId::new();
        let b = ClientId::new();

        let frame: TargetFrame = [("a".to_string(), InputValue::Button(true))]
            .into_iter()
            .collect();
        sink.deliver(a, &frame).await.unwrap();
        sink.deliver(b, &frame).await.unwrap();
        sink.deliver(a, &frame).await.unwrap();

        assert_eq!(handle.delivered().len(), 3);
        assert_eq!(handle.frames_for(a).len(), 2);
        assert_eq!(handle.frames_for(b).len(), 1);
    }

    #[tokio::test]
    async fn fail_mode_returns_error() {
        let sink = MockSink::new();
        let handle = sink.handle();
        handle.set_fail(true);

        let err = sink.deliver(ClientId::new(), &TargetFrame::new()).await;
        assert!(matches!(err, Err(SinkError::Unavailable)));
        assert!(handle.delivered().is_empty());
    }
}
