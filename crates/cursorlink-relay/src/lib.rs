//! cursorlink-relay library crate.
//!
//! The relay lets two devices rendezvous under a shared session token and
//! forwards pointer movement and clicks between them.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Touchpad peer (JSON over WebSocket)        Display peer
//!         ↕                                       ↕
//! [cursorlink-relay]
//!   ├── domain/           RelayConfig
//!   ├── application/      SessionDirectory, EventRouter, ConnectionLifecycle
//!   └── infrastructure/
//!         ├── ws_server/   Accept loop, per-connection reader/writer
//!         ├── config_file/ Optional TOML settings
//!         └── net_info/    Startup banner addresses
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async).
//! - `application` depends on `domain` and `cursorlink-core`; it uses tokio
//!   only for the non-blocking queue handles of live connections.
//! - `infrastructure` depends on all other layers plus `tokio-tungstenite`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: session directory, routing, connection lifecycle.
pub mod application;

/// Infrastructure layer: WebSocket server and config file.
pub mod infrastructure;
