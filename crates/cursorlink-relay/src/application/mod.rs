//! Application layer for cursorlink-relay.
//!
//! The application layer knows *what* the relay does (pair connections by
//! session, forward events between them) but not *how* bytes reach a socket.
//!
//! # Responsibilities
//!
//! - Keeping the session directory (`session_directory`)
//! - Forwarding movement and click events (`event_router`)
//! - Driving each connection through its lifecycle (`connection_lifecycle`)
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod connection_lifecycle;
pub mod event_router;
pub mod session_directory;

pub use connection_lifecycle::{ConnectionLifecycle, ConnectionState, Handled};
pub use event_router::{EventRouter, PeerEvent, RouteOutcome};
pub use session_directory::{
    ConnectionHandle, Delivery, JoinOutcome, LeaveOutcome, Registration, SessionDirectory,
};
