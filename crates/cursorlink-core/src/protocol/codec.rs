//! Text-frame codec for the cursorlink JSON protocol.
//!
//! Each WebSocket text frame carries exactly one message object.  Decoding is
//! done in two steps so a bad frame produces a useful error: the frame must
//! first be a JSON object with a string `"type"` field, and only then is it
//! matched against the message enum.
//!
//! ```rust
//! use cursorlink_core::protocol::{decode_client_message, ClientMessage};
//!
//! let msg = decode_client_message(r#"{"type":"cursor-click","sessionId":"abc123"}"#).unwrap();
//! assert!(matches!(msg, ClientMessage::CursorClick { .. }));
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{ClientMessage, ServerMessage};

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    /// The frame is JSON but not an object with a string `"type"` field.
    #[error("frame has no string \"type\" field")]
    MissingType,

    /// The `"type"` is unknown or the fields do not match that type.
    #[error("malformed {kind} message: {reason}")]
    Malformed { kind: String, reason: String },

    /// The message could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes a text frame sent by a peer.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is not a well-formed
/// [`ClientMessage`].
pub fn decode_client_message(frame: &str) -> Result<ClientMessage, ProtocolError> {
    decode(frame)
}

/// Decodes a text frame sent by the relay.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is not a well-formed
/// [`ServerMessage`].
pub fn decode_server_message(frame: &str) -> Result<ServerMessage, ProtocolError> {
    decode(frame)
}

/// Encodes a peer message into a text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serialization fails.
pub fn encode_client_message(msg: &ClientMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

/// Encodes a relay message into a text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if serialization fails.
pub fn encode_server_message(msg: &ServerMessage) -> Result<String, ProtocolError> {
    encode(msg)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(frame: &str) -> Result<T, ProtocolError> {
    let value: Value =
        serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let kind = value
        .as_object()
        .and_then(|obj| obj.get("type"))
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

fn encode<T: Serialize>(msg: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Serialize(e.to_string()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{Role, SessionId};

    #[test]
    fn test_decode_join() {
        let msg = decode_client_message(r#"{"type":"join","sessionId":"abc123","role":"laptop"}"#)
            .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                session_id: SessionId::new("abc123"),
                role: Role::laptop(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let err = decode_client_message("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_rejects_array_frame() {
        let err = decode_client_message("[1,2,3]").unwrap_err();
        assert_eq!(err, ProtocolError::MissingType);
    }

    #[test]
    fn test_decode_rejects_numeric_type() {
        let err = decode_client_message(r#"{"type":7}"#).unwrap_err();
        assert_eq!(err, ProtocolError::MissingType);
    }

    #[test]
    fn test_decode_unknown_type_reports_kind() {
        let err = decode_client_message(r#"{"type":"teleport","sessionId":"s"}"#).unwrap_err();
        match err {
            ProtocolError::Malformed { kind, .. } => assert_eq!(kind, "teleport"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_session_id_is_malformed() {
        let err = decode_client_message(r#"{"type":"cursor-click"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed { .. }));
    }

    #[test]
    fn test_encode_server_click() {
        let frame = encode_server_message(&ServerMessage::CursorClick).unwrap();
        assert_eq!(frame, r#"{"type":"cursor-click"}"#);
    }

    #[test]
    fn test_client_frame_decodes_on_the_relay_side() {
        let msg = ClientMessage::CursorMove {
            session_id: SessionId::new("abc123"),
            dx: 10.0,
            dy: -5.0,
        };
        let frame = encode_client_message(&msg).unwrap();
        assert_eq!(decode_client_message(&frame).unwrap(), msg);
    }

    #[test]
    fn test_server_frame_decodes_on_the_peer_side() {
        let frame = r#"{"type":"device-disconnected","role":"mobile"}"#;
        assert_eq!(
            decode_server_message(frame).unwrap(),
            ServerMessage::DeviceDisconnected {
                role: Role::mobile()
            }
        );
    }
}
