//! Domain entities for cursorlink.
//!
//! This module contains the identity types shared by the relay and the peers.
//! Nothing in here performs I/O or depends on an async runtime, so the types
//! can be used and tested on any platform without setup.

/// Session tokens, role labels, and connection identities.
pub mod session;
