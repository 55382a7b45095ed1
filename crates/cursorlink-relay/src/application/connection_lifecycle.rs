//! Per-connection state machine.
//!
//! ```text
//!  connect ──► Unregistered ──join──► Registered(session, role) ──┐
//!                  │                     │   ▲                    │
//!                  │                     └───┘ join (re-register) │
//!                  └────────── transport closed ─────────────────►┴──► Closed
//! ```
//!
//! Transport closure is the only teardown path; there is no "leave" message.
//! A peer that reconnects is a brand-new connection that starts over in
//! `Unregistered`.
//!
//! The infrastructure layer feeds decoded frames into
//! [`ConnectionLifecycle::on_message`] and calls
//! [`ConnectionLifecycle::on_close`] when the socket goes away.  Dropping the
//! lifecycle also closes it, so a connection task that is cancelled halfway
//! still removes itself from the directory.

use std::sync::Arc;

use cursorlink_core::{ClientMessage, ConnectionId, SessionId};

use crate::application::event_router::{EventRouter, PeerEvent, RouteOutcome};
use crate::application::session_directory::{
    ConnectionHandle, JoinOutcome, LeaveOutcome, Registration, SessionDirectory,
};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Unregistered,
    Registered(Registration),
    Closed,
}

/// What [`ConnectionLifecycle::on_message`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Joined(JoinOutcome),
    Routed(RouteOutcome),
    /// The connection is already closed.
    Ignored,
}

/// Lifecycle handler for one relay connection.
pub struct ConnectionLifecycle {
    handle: ConnectionHandle,
    directory: Arc<SessionDirectory>,
    router: EventRouter,
    state: ConnectionState,
}

impl ConnectionLifecycle {
    pub fn new(handle: ConnectionHandle, directory: Arc<SessionDirectory>) -> Self {
        let router = EventRouter::new(Arc::clone(&directory));
        Self {
            handle,
            directory,
            router,
            state: ConnectionState::Unregistered,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Applies one inbound message.
    pub fn on_message(&mut self, msg: ClientMessage) -> Handled {
        if self.state == ConnectionState::Closed {
            return Handled::Ignored;
        }

        match msg {
            ClientMessage::Join { session_id, role } => {
                let outcome =
                    self.directory
                        .join(session_id.clone(), role.clone(), self.handle.clone());
                self.state = ConnectionState::Registered(Registration { session_id, role });
                Handled::Joined(outcome)
            }
            ClientMessage::CursorMove { session_id, dx, dy } => {
                Handled::Routed(self.route(&session_id, PeerEvent::Move { dx, dy }))
            }
            ClientMessage::CursorClick { session_id } => {
                Handled::Routed(self.route(&session_id, PeerEvent::Click))
            }
        }
    }

    /// Transitions to `Closed` and removes the connection from the directory.
    ///
    /// Returns the leave outcome the first time it is called on a connection
    /// that still held a slot; `None` otherwise.
    pub fn on_close(&mut self) -> Option<LeaveOutcome> {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        match previous {
            ConnectionState::Registered(_) => self.directory.leave(self.handle.id()),
            ConnectionState::Unregistered | ConnectionState::Closed => None,
        }
    }

    fn route(&self, session_id: &SessionId, event: PeerEvent) -> RouteOutcome {
        let registration = match &self.state {
            ConnectionState::Registered(reg) => Some(reg),
            _ => None,
        };
        self.router
            .route(self.handle.id(), registration, session_id, event)
    }
}

impl Drop for ConnectionLifecycle {
    fn drop(&mut self) {
        self.on_close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cursorlink_core::{Role, ServerMessage, SessionId};
    use tokio::sync::mpsc;

    fn lifecycle(
        directory: &Arc<SessionDirectory>,
    ) -> (ConnectionLifecycle, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(16);
        let handle = ConnectionHandle::new(ConnectionId::new(), tx);
        (ConnectionLifecycle::new(handle, Arc::clone(directory)), rx)
    }

    fn join(session: &str, role: Role) -> ClientMessage {
        ClientMessage::Join {
            session_id: SessionId::new(session),
            role,
        }
    }

    #[test]
    fn test_new_connection_is_unregistered() {
        let dir = Arc::new(SessionDirectory::new());
        let (conn, _rx) = lifecycle(&dir);
        assert_eq!(conn.state(), &ConnectionState::Unregistered);
    }

    #[test]
    fn test_join_registers_connection() {
        // Arrange
        let dir = Arc::new(SessionDirectory::new());
        let (mut conn, _rx) = lifecycle(&dir);

        // Act
        let handled = conn.on_message(join("abc123", Role::laptop()));

        // Assert
        assert!(matches!(handled, Handled::Joined(_)));
        assert_eq!(
            conn.state(),
            &ConnectionState::Registered(Registration {
                session_id: SessionId::new("abc123"),
                role: Role::laptop(),
            })
        );
        assert_eq!(dir.connection_count(), 1);
    }

    #[test]
    fn test_events_before_join_are_dropped() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut conn, _rx) = lifecycle(&dir);

        let handled = conn.on_message(ClientMessage::CursorClick {
            session_id: SessionId::new("abc123"),
        });

        assert_eq!(handled, Handled::Routed(RouteOutcome::NotRegistered));
    }

    #[test]
    fn test_scenario_laptop_receives_join_move_and_click() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut laptop, mut laptop_rx) = lifecycle(&dir);
        let (mut mobile, _mobile_rx) = lifecycle(&dir);

        laptop.on_message(join("abc123", Role::laptop()));
        mobile.on_message(join("abc123", Role::mobile()));
        mobile.on_message(ClientMessage::CursorMove {
            session_id: SessionId::new("abc123"),
            dx: 10.0,
            dy: -5.0,
        });
        mobile.on_message(ClientMessage::CursorClick {
            session_id: SessionId::new("abc123"),
        });

        assert_eq!(
            laptop_rx.try_recv().unwrap(),
            ServerMessage::DeviceConnected {
                role: Role::mobile()
            }
        );
        assert_eq!(
            laptop_rx.try_recv().unwrap(),
            ServerMessage::CursorMove { dx: 10.0, dy: -5.0 }
        );
        assert_eq!(laptop_rx.try_recv().unwrap(), ServerMessage::CursorClick);
    }

    #[test]
    fn test_close_leaves_directory_once() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut conn, _rx) = lifecycle(&dir);
        conn.on_message(join("s", Role::mobile()));

        assert!(conn.on_close().is_some());
        assert!(conn.on_close().is_none());
        assert_eq!(conn.state(), &ConnectionState::Closed);
        assert_eq!(dir.session_count(), 0);
    }

    #[test]
    fn test_closed_connection_ignores_messages() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut conn, _rx) = lifecycle(&dir);
        conn.on_close();

        let handled = conn.on_message(join("s", Role::mobile()));

        assert_eq!(handled, Handled::Ignored);
        assert_eq!(dir.connection_count(), 0);
    }

    #[test]
    fn test_drop_removes_registration() {
        let dir = Arc::new(SessionDirectory::new());
        {
            let (mut conn, _rx) = lifecycle(&dir);
            conn.on_message(join("s", Role::mobile()));
            assert_eq!(dir.connection_count(), 1);
        }
        assert_eq!(dir.connection_count(), 0);
    }

    #[test]
    fn test_surviving_peer_events_dropped_after_close() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut laptop, _laptop_rx) = lifecycle(&dir);
        let (mut mobile, _mobile_rx) = lifecycle(&dir);
        laptop.on_message(join("s", Role::laptop()));
        mobile.on_message(join("s", Role::mobile()));

        laptop.on_close();
        let handled = mobile.on_message(ClientMessage::CursorClick {
            session_id: SessionId::new("s"),
        });

        assert_eq!(handled, Handled::Routed(RouteOutcome::NoPeer));
    }

    #[test]
    fn test_displaced_connection_no_longer_receives_events() {
        let dir = Arc::new(SessionDirectory::new());
        let (mut laptop, _laptop_rx) = lifecycle(&dir);
        let (mut old_mobile, mut old_rx) = lifecycle(&dir);
        let (mut new_mobile, mut new_rx) = lifecycle(&dir);
        laptop.on_message(join("s", Role::laptop()));
        old_mobile.on_message(join("s", Role::mobile()));
        new_mobile.on_message(join("s", Role::mobile()));

        laptop.on_message(ClientMessage::CursorMove {
            session_id: SessionId::new("s"),
            dx: 1.0,
            dy: 1.0,
        });

        assert_eq!(
            new_rx.try_recv().unwrap(),
            ServerMessage::CursorMove { dx: 1.0, dy: 1.0 }
        );
        assert!(old_rx.try_recv().is_err());

        // The displaced connection closing must not evict its replacement.
        old_mobile.on_close();
        assert_eq!(dir.participant_count(&SessionId::new("s")), 2);
    }
}
