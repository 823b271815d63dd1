//! Wire format: one JSON object per WebSocket text frame.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ProtocolError;

/// Maximum inbound message size (64 KiB). Prevents allocation bombs; a
/// controller frame is a few hundred bytes at most.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Encode a message as a JSON string.
pub fn encode_message<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

/// Decode a message from a JSON text payload.
pub fn decode_message<T: DeserializeOwned>(payload: &str) -> Result<T, ProtocolError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            len: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    serde_json::from_str(payload).map_err(|e| ProtocolError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use padlink_types::{ClientId, ClientMessage, ControlCommand, ServerMessage};

    #[test]
    fn encode_decode_roundtrip() {
        let msg = ServerMessage::welcome(ClientId::new());
        let text = encode_message(&msg).unwrap();
        let decoded: ServerMessage = decode_message(&text).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn decode_client_command() {
        let msg: ClientMessage = decode_message(r#"{"command": "status"}"#).unwrap();
        match msg {
            ClientMessage::Control { command } => assert_eq!(command, ControlCommand::Status),
            ClientMessage::ControllerInput { .. } => panic!("unexpected message type"),
        }
    }

    #[test]
    fn malformed_payload_is_deserialization_error() {
        let err = decode_message::<ClientMessage>("not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Deserialization(_)));
    }

    #[test]
    fn oversized_payload_rejected() {
        let huge = format!(r#"{{"command": "{}"}}"#, "x".repeat(MAX_MESSAGE_SIZE));
        let err = decode_message::<ClientMessage>(&huge).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
    }
}
