//! Infrastructure layer for cursorlink-peer.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `cursorlink_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`connection`** – WebSocket client that connects to the relay, sends
//!   join/move/click frames, and delivers inbound relay messages on a
//!   channel.

pub mod connection;

pub use connection::{PeerConnection, PeerError, PeerEvent};
