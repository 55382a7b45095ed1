//! Domain layer for cursorlink-relay.
//!
//! Pure configuration types with no dependencies on I/O, networking, or async
//! runtimes.  The wire messages and session identity types live in
//! `cursorlink-core` because the peer client needs them too.

pub mod config;

pub use config::{
    RelayConfig, DEFAULT_OUTBOUND_QUEUE, DEFAULT_PORT, MAX_OUTBOUND_QUEUE, MAX_PING_SECS,
};
