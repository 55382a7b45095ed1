//! JSON message types for the cursorlink wire protocol.
//!
//! Peers and the relay exchange WebSocket text frames, each holding exactly
//! one JSON object.  The object's `"type"` field names the message; all other
//! fields sit next to it in the same object:
//!
//! ```json
//! {"type":"join","sessionId":"abc123","role":"laptop"}
//! {"type":"cursor-move","sessionId":"abc123","dx":10,"dy":-5}
//! {"type":"cursor-click","sessionId":"abc123"}
//! ```
//!
//! # Why two enums?
//!
//! The two directions carry different shapes.  A peer always names the
//! session it is talking about; the relay strips that field before forwarding
//! because the receiving peer already knows which session it is in.  Keeping
//! [`ClientMessage`] and [`ServerMessage`] apart makes it a compile-time error
//! to forward a message without stripping it.

use serde::{Deserialize, Serialize};

use crate::domain::session::{Role, SessionId};

// ── Peer → Relay messages ─────────────────────────────────────────────────────

/// All messages a peer can send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Registers the sending connection under `session_id` as `role`.
    ///
    /// `join-session` is accepted as an alias for older peers.
    #[serde(alias = "join-session", rename_all = "camelCase")]
    Join { session_id: SessionId, role: Role },

    /// Relative pointer displacement since the previous movement message.
    #[serde(rename_all = "camelCase")]
    CursorMove {
        session_id: SessionId,
        dx: f64,
        dy: f64,
    },

    /// A click at whatever position the receiving side currently shows.
    #[serde(rename_all = "camelCase")]
    CursorClick { session_id: SessionId },
}

impl ClientMessage {
    /// The session the message is addressed to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            ClientMessage::Join { session_id, .. }
            | ClientMessage::CursorMove { session_id, .. }
            | ClientMessage::CursorClick { session_id } => session_id,
        }
    }

    /// Wire name of the message, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Join { .. } => "join",
            ClientMessage::CursorMove { .. } => "cursor-move",
            ClientMessage::CursorClick { .. } => "cursor-click",
        }
    }
}

// ── Relay → Peer messages ─────────────────────────────────────────────────────

/// All messages the relay sends to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Another participant just joined the session as `role`.
    DeviceConnected { role: Role },

    /// The participant holding `role` left the session.
    DeviceDisconnected { role: Role },

    /// Forwarded movement; the sender's `sessionId` has been stripped.
    CursorMove { dx: f64, dy: f64 },

    /// Forwarded click.  Serialized as `{"type":"cursor-click"}`.
    CursorClick,
}

impl ServerMessage {
    /// Wire name of the message, for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::DeviceConnected { .. } => "device-connected",
            ServerMessage::DeviceDisconnected { .. } => "device-disconnected",
            ServerMessage::CursorMove { .. } => "cursor-move",
            ServerMessage::CursorClick => "cursor-click",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
