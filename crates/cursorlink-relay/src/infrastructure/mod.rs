//! Infrastructure layer for cursorlink-relay.
//!
//! The infrastructure layer handles all I/O.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and performing the WebSocket upgrade
//! - Spawning per-connection Tokio tasks and their writer tasks
//! - Reading the optional TOML config file
//! - Working out which addresses to print in the startup banner
//!
//! # What does NOT belong here?
//!
//! - Session bookkeeping and routing decisions (that is the application layer)
//! - Message type definitions (that is `cursorlink-core`)

pub mod config_file;
pub mod net_info;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use config_file::{ConfigError, RelayFileConfig};
pub use ws_server::{bind_listener, run_server, serve};
