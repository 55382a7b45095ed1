//! Event routing: forward movement and click events to the other participant.
//!
//! The router is deliberately dumb.  It strips the sender's `sessionId`,
//! looks up the other participant through the [`SessionDirectory`], and
//! drops the event into that participant's outbound queue.  There is no
//! clamping, smoothing, acknowledgement, retry, or buffering: accumulating
//! deltas into a cursor position is the receiving peer's job, and an event
//! with nowhere to go is simply dropped.

use std::sync::Arc;

use cursorlink_core::{ConnectionId, ServerMessage, SessionId};

use crate::application::session_directory::{Delivery, Registration, SessionDirectory};

/// What happened to a routed event.
///
/// Only used for logging and tests; the sender is never told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Queued for the other participant.
    Forwarded,
    /// The sending connection has not joined any session.
    NotRegistered,
    /// The event names a session other than the one the sender joined.
    SessionMismatch,
    /// No other participant is currently registered.
    NoPeer,
    /// The other participant's outbound queue is full.
    PeerBusy,
    /// The other participant's connection is closing.
    PeerClosed,
}

/// Movement or click event stripped of its session field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeerEvent {
    Move { dx: f64, dy: f64 },
    Click,
}

impl PeerEvent {
    fn into_server_message(self) -> ServerMessage {
        match self {
            PeerEvent::Move { dx, dy } => ServerMessage::CursorMove { dx, dy },
            PeerEvent::Click => ServerMessage::CursorClick,
        }
    }
}

/// Forwards events between the participants of a session.
#[derive(Debug, Clone)]
pub struct EventRouter {
    directory: Arc<SessionDirectory>,
}

impl EventRouter {
    pub fn new(directory: Arc<SessionDirectory>) -> Self {
        Self { directory }
    }

    /// Routes `event` from `sender` to the other participant of `session_id`.
    ///
    /// `registration` is the sender's current registration as tracked by its
    /// connection handler; an event for any other session is dropped so one
    /// session can never inject events into another.
    pub fn route(
        &self,
        sender: ConnectionId,
        registration: Option<&Registration>,
        session_id: &SessionId,
        event: PeerEvent,
    ) -> RouteOutcome {
        let Some(registration) = registration else {
            return RouteOutcome::NotRegistered;
        };
        if &registration.session_id != session_id {
            return RouteOutcome::SessionMismatch;
        }

        let Some(peer) = self.directory.resolve(session_id, sender) else {
            return RouteOutcome::NoPeer;
        };

        match peer.deliver(event.into_server_message()) {
            Delivery::Queued => RouteOutcome::Forwarded,
            Delivery::QueueFull => RouteOutcome::PeerBusy,
            Delivery::Closed => RouteOutcome::PeerClosed,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
