//! cursorlink-peer library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does a peer do? (for beginners)
//!
//! A session has two sides.  The *touchpad* side (usually a phone) turns
//! finger movement into relative `cursor-move` deltas and taps into
//! `cursor-click` events.  The *display* side (usually a laptop) owns a
//! virtual cursor and moves it by whatever deltas arrive.
//!
//! Neither side talks to the other directly.  Both connect to the relay,
//! announce the same session token, and let the relay forward events:
//!
//! 1. The display generates a token and joins as `laptop`.
//! 2. The touchpad is given the token and joins as `mobile`.
//! 3. The relay tells the display `device-connected { role: "mobile" }`.
//! 4. Touch movement flows to the display as `cursor-move { dx, dy }`.

/// Application layer: cursor and touch tracking, touchpad commands.
pub mod application;

/// Infrastructure layer: the WebSocket connection to the relay.
pub mod infrastructure;
