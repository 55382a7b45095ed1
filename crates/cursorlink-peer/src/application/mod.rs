//! Application layer for cursorlink-peer.
//!
//! Pure state machines with no I/O: the display-side cursor, the
//! touchpad-side touch tracker, and the line-oriented touchpad commands.

pub mod command;
pub mod cursor_tracker;
pub mod touch_tracker;

pub use command::{CommandError, TouchpadCommand};
pub use cursor_tracker::{CursorPosition, CursorTracker};
pub use touch_tracker::TouchTracker;
