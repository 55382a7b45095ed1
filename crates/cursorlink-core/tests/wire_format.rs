//! Integration tests for the cursorlink wire format.
//!
//! These tests pin the exact JSON shapes that browser peers depend on,
//! exercising the codec and message types together through the public API.

use cursorlink_core::{
    decode_client_message, decode_server_message, encode_server_message, ClientMessage,
    ProtocolError, Role, ServerMessage, SessionId,
};
use serde_json::{json, Value};

fn parse(frame: &str) -> Value {
    serde_json::from_str(frame).expect("encoder must emit valid JSON")
}

#[test]
fn test_pairing_scenario_frames() {
    // Arrange: the frames a mobile peer sends in the reference pairing flow.
    let join = r#"{"type":"join","sessionId":"abc123","role":"mobile"}"#;
    let mv = r#"{"type":"cursor-move","sessionId":"abc123","dx":10,"dy":-5}"#;
    let click = r#"{"type":"cursor-click","sessionId":"abc123"}"#;

    // Act
    let join = decode_client_message(join).unwrap();
    let mv = decode_client_message(mv).unwrap();
    let click = decode_client_message(click).unwrap();

    // Assert
    assert_eq!(
        join,
        ClientMessage::Join {
            session_id: SessionId::new("abc123"),
            role: Role::mobile()
        }
    );
    assert_eq!(
        mv,
        ClientMessage::CursorMove {
            session_id: SessionId::new("abc123"),
            dx: 10.0,
            dy: -5.0
        }
    );
    assert_eq!(
        click,
        ClientMessage::CursorClick {
            session_id: SessionId::new("abc123")
        }
    );
}

#[test]
fn test_forwarded_frames_match_what_browsers_expect() {
    let moved = encode_server_message(&ServerMessage::CursorMove { dx: 10.0, dy: -5.0 }).unwrap();
    let clicked = encode_server_message(&ServerMessage::CursorClick).unwrap();
    let joined = encode_server_message(&ServerMessage::DeviceConnected {
        role: Role::mobile(),
    })
    .unwrap();

    assert_eq!(parse(&moved), json!({"type": "cursor-move", "dx": 10.0, "dy": -5.0}));
    assert_eq!(parse(&clicked), json!({"type": "cursor-click"}));
    assert_eq!(parse(&joined), json!({"type": "device-connected", "role": "mobile"}));
}

#[test]
fn test_extra_fields_are_ignored() {
    // Browsers may attach their own bookkeeping fields; they must not break decoding.
    let frame = r#"{"type":"cursor-click","sessionId":"abc123","ts":1700000000}"#;
    assert!(decode_client_message(frame).is_ok());
}

#[test]
fn test_server_message_is_not_a_client_message() {
    // A forwarded move has no sessionId and must not be accepted as peer input.
    let frame = r#"{"type":"cursor-move","dx":1,"dy":2}"#;
    assert!(matches!(
        decode_client_message(frame),
        Err(ProtocolError::Malformed { .. })
    ));
    assert!(decode_server_message(frame).is_ok());
}

#[test]
fn test_empty_session_token_is_not_validated() {
    // The relay performs no validation of token shape.
    let frame = r#"{"type":"join","sessionId":"","role":"laptop"}"#;
    let msg = decode_client_message(frame).unwrap();
    assert_eq!(msg.session_id().as_str(), "");
}
