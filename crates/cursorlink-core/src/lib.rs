//! # cursorlink-core
//!
//! Shared library for cursorlink containing the wire protocol, its JSON
//! codec, and the session identity types.
//!
//! This crate is used by both the relay and the peer client.  It has no
//! dependencies on sockets or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! cursorlink turns a phone into a touchpad for another screen.  Both devices
//! connect to a relay, announce the same session token, and from then on the
//! relay forwards pointer movement and clicks from one to the other.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`protocol`** – The JSON messages exchanged over the WebSocket and the
//!   codec that turns text frames into typed Rust values and back.
//!
//! - **`domain`** – Session tokens, role labels, and connection identities.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `cursorlink_core::SessionId` instead of the full module path.
pub use domain::session::{roles, ConnectionId, Role, SessionId};
pub use protocol::codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    ProtocolError,
};
pub use protocol::messages::{ClientMessage, ServerMessage};
