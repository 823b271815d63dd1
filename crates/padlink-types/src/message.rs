//! Wire message types.
//!
//! Messages are exchanged as JSON text frames over the WebSocket
//! connection between clients and the relay.

use serde::{Deserialize, Serialize};

use crate::client::ClientId;
use crate::input::InputFrame;

/// A message received from a client.
///
/// The two shapes are discriminated by their fields: controller input
/// carries `{"type": "controller_input", "input": {...}}`, lifecycle
/// requests carry `{"command": "..."}`. Anything else fails to decode and
/// is dropped by the session loop with a warning.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    /// A frame of controller input to translate and inject.
    ControllerInput {
        #[serde(rename = "type")]
        kind: InputKind,
        input: InputFrame,
    },

    /// An emulator lifecycle request.
    Control { command: ControlCommand },
}

/// Discriminator for input messages. Single-valued: decoding fails unless
/// the `type` field is exactly `"controller_input"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    ControllerInput,
}

/// Emulator lifecycle commands a client may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    /// Launch the emulator if it is not already running.
    StartDolphin,
    /// Terminate the emulator if it is running.
    StopDolphin,
    /// Query whether the emulator is running; answered to the requester only.
    Status,
}

/// A message sent from the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// Sent once immediately after successful registration.
    Welcome { message: String, client_id: ClientId },

    /// Reply to a status query; unicast to the requester.
    Status { status: ProcessStatus },

    /// An error notification: capacity rejection (unicast, then close) or
    /// a process-lifecycle failure (broadcast to every session).
    Error { error: String },
}

impl ServerMessage {
    /// The welcome message sent after registration.
    #[must_use]
    pub fn welcome(client_id: ClientId) -> Self {
        Self::Welcome {
            message: "Connected to Dolphin Controller Server".to_string(),
            client_id,
        }
    }

    /// An error notification with the given reason.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            error: reason.into(),
        }
    }
}

/// Observable state of the emulator process, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessStatus {
    Running,
    Stopped,
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}
