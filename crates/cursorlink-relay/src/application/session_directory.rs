//! SessionDirectory: the relay's in-memory map of sessions and participants.
//!
//! Every connection that declares a `(session, role)` pair ends up in one of
//! the session's role slots.  The directory answers one routing question,
//! "who is the other participant of this sender's session?", and cleans up
//! when a connection goes away.
//!
//! # Data layout
//!
//! ```text
//! sessions:      SessionId    ──►  Session { role ──► ConnectionHandle }
//! registrations: ConnectionId ──►  (SessionId, Role)      (reverse index)
//! ```
//!
//! The reverse index makes `leave` O(1) instead of a scan over all sessions,
//! and lets `resolve` check that the sender really occupies a slot in the
//! session it names.
//!
//! # Locking
//!
//! One `std::sync::Mutex` guards both maps.  Every operation is a handful of
//! hash-map lookups plus non-blocking `try_send`s, and no `.await` happens
//! while the lock is held, so a coarse lock is cheaper than sharding for the
//! session counts a relay like this sees.
//!
//! # Lifecycle of a session (for beginners)
//!
//! ```text
//! first join ──► session created ──► both slots filled ──► ...
//!                                                          │
//!                               last participant leaves ───┴──► session removed
//! ```
//!
//! Sessions are created lazily on the first join to a token and removed as
//! soon as their last slot is vacated, so a long-running relay does not
//! accumulate dead sessions.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use cursorlink_core::{ConnectionId, Role, ServerMessage, SessionId};
use tokio::sync::mpsc;
use tracing::{debug, info};

// ── Connection handle ─────────────────────────────────────────────────────────

/// Result of handing a message to a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message is queued for the connection's writer task.
    Queued,
    /// The queue is full; the message was dropped.
    QueueFull,
    /// The writer task has gone away; the message was dropped.
    Closed,
}

/// Routing handle for one live connection.
///
/// Holds the connection's identity and the sending half of its bounded
/// outbound queue.  The directory keeps clones of these; the connection task
/// owns the receiving half and the socket itself.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues `msg` for delivery without waiting.
    pub fn deliver(&self, msg: ServerMessage) -> Delivery {
        match self.tx.try_send(msg) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::QueueFull,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// Where a connection is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub session_id: SessionId,
    pub role: Role,
}

/// Summary of a [`SessionDirectory::join`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// `true` if this join created the session.
    pub created_session: bool,
    /// The connection that previously held the role slot, if any.
    pub displaced: Option<ConnectionId>,
    /// Number of other participants that were sent `device-connected`.
    pub notified: usize,
}

/// Summary of a [`SessionDirectory::leave`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub session_id: SessionId,
    pub role: Role,
    /// `true` if the session had no participants left and was removed.
    pub session_removed: bool,
    /// Number of remaining participants that were sent `device-disconnected`.
    pub notified: usize,
}

/// Role slots of one session.
///
/// A `BTreeMap` keeps "the other participant" deterministic should a peer
/// ever invent a third role label.
#[derive(Debug, Default)]
struct Session {
    slots: BTreeMap<Role, ConnectionHandle>,
}

impl Session {
    fn role_of(&self, id: ConnectionId) -> Option<&Role> {
        self.slots
            .iter()
            .find(|(_, handle)| handle.id() == id)
            .map(|(role, _)| role)
    }

    fn others<'a>(&'a self, role: &'a Role) -> impl Iterator<Item = &'a ConnectionHandle> + 'a {
        self.slots
            .iter()
            .filter(move |(r, _)| *r != role)
            .map(|(_, handle)| handle)
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    sessions: HashMap<SessionId, Session>,
    registrations: HashMap<ConnectionId, Registration>,
}

// ── Directory ─────────────────────────────────────────────────────────────────

/// Process-wide directory of sessions, shared by all connection tasks.
#[derive(Debug)]
pub struct SessionDirectory {
    state: Mutex<DirectoryState>,
    notify_departures: bool,
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDirectory {
    /// Creates an empty directory that sends departure notices.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DirectoryState::default()),
            notify_departures: true,
        }
    }

    /// Enables or disables `device-disconnected` notices on leave.
    pub fn with_departure_notices(mut self, enabled: bool) -> Self {
        self.notify_departures = enabled;
        self
    }

    /// Registers `conn` as `role` in `session_id`.
    ///
    /// Creates the session if needed and notifies every other participant
    /// already present with `device-connected{role}`.  Nothing is buffered
    /// for participants that have not joined yet.
    ///
    /// If the role slot is already occupied, the new connection silently
    /// takes it over (last writer wins).  This is intentional: a phone that
    /// dropped off Wi-Fi reconnects with a fresh connection and simply joins
    /// again, without any explicit leave, and must not be locked out by its
    /// own stale registration.  The displaced connection gets no notice; it
    /// just stops receiving events.
    ///
    /// A connection that was registered somewhere else first leaves that
    /// slot.
    pub fn join(&self, session_id: SessionId, role: Role, conn: ConnectionHandle) -> JoinOutcome {
        let mut state = self.lock();
        let conn_id = conn.id();

        let new_registration = Registration {
            session_id: session_id.clone(),
            role: role.clone(),
        };
        if let Some(previous) = state.registrations.get(&conn_id).cloned() {
            if previous != new_registration {
                self.release(&mut state, conn_id, previous);
            }
        }

        let created_session = !state.sessions.contains_key(&session_id);
        let session = state.sessions.entry(session_id.clone()).or_default();

        let displaced = session
            .slots
            .insert(role.clone(), conn)
            .map(|old| old.id())
            .filter(|old_id| *old_id != conn_id);

        let mut notified = 0;
        for other in session.others(&role) {
            if other.deliver(ServerMessage::DeviceConnected { role: role.clone() })
                == Delivery::Queued
            {
                notified += 1;
            }
        }

        if let Some(old_id) = displaced {
            state.registrations.remove(&old_id);
            info!("session {session_id}: connection {conn_id} replaced {old_id} as {role}");
        } else {
            info!("session {session_id}: connection {conn_id} joined as {role}");
        }
        state.registrations.insert(conn_id, new_registration);

        JoinOutcome {
            created_session,
            displaced,
            notified,
        }
    }

    /// Returns the other participant of `session_id`, from the point of view
    /// of `sender`.
    ///
    /// Returns `None` when the sender does not hold a slot in that session
    /// (never joined, joined a different session, or was displaced) or when
    /// no other participant is present.
    pub fn resolve(&self, session_id: &SessionId, sender: ConnectionId) -> Option<ConnectionHandle> {
        let state = self.lock();
        let session = state.sessions.get(session_id)?;
        let role = session.role_of(sender)?;
        // Bound to a local so the iterator borrowing `state` drops before the guard.
        #[allow(clippy::let_and_return)]
        let peer = session.others(role).next().cloned();
        peer
    }

    /// Removes `conn` from whatever slot it holds.
    ///
    /// Returns `None` if the connection was not registered (never joined, or
    /// already displaced by a newer connection for the same role).
    pub fn leave(&self, conn: ConnectionId) -> Option<LeaveOutcome> {
        let mut state = self.lock();
        let registration = state.registrations.get(&conn).cloned()?;
        Some(self.release(&mut state, conn, registration))
    }

    /// Current registration of `conn`, if any.
    pub fn registration(&self, conn: ConnectionId) -> Option<Registration> {
        self.lock().registrations.get(&conn).cloned()
    }

    /// Number of sessions with at least one participant.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Number of registered connections across all sessions.
    pub fn connection_count(&self) -> usize {
        self.lock().registrations.len()
    }

    /// Number of occupied role slots in `session_id`.
    pub fn participant_count(&self, session_id: &SessionId) -> usize {
        self.lock()
            .sessions
            .get(session_id)
            .map_or(0, |s| s.slots.len())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        // A panic while holding the lock cannot leave the maps half-updated in
        // a way that matters for routing, so keep serving.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(
        &self,
        state: &mut DirectoryState,
        conn: ConnectionId,
        registration: Registration,
    ) -> LeaveOutcome {
        state.registrations.remove(&conn);
        let Registration { session_id, role } = registration;

        let mut notified = 0;
        let mut session_removed = false;
        if let Some(session) = state.sessions.get_mut(&session_id) {
            if session.slots.get(&role).map(ConnectionHandle::id) == Some(conn) {
                session.slots.remove(&role);
            }

            if self.notify_departures {
                for other in session.others(&role) {
                    if other.deliver(ServerMessage::DeviceDisconnected { role: role.clone() })
                        == Delivery::Queued
                    {
                        notified += 1;
                    }
                }
            }

            if session.slots.is_empty() {
                state.sessions.remove(&session_id);
                session_removed = true;
                debug!("session {session_id}: last participant left, session removed");
            }
        }

        info!("session {session_id}: connection {conn} ({role}) left");

        LeaveOutcome {
            session_id,
            role,
            session_removed,
            notified,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> (ConnectionHandle, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(16);
        (ConnectionHandle::new(ConnectionId::new(), tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn sid(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn test_first_join_creates_session_without_notification() {
        // Arrange
        let dir = SessionDirectory::new();
        let (laptop, mut laptop_rx) = conn();

        // Act
        let outcome = dir.join(sid("abc123"), Role::laptop(), laptop);

        // Assert
        assert!(outcome.created_session);
        assert_eq!(outcome.notified, 0);
        assert_eq!(dir.session_count(), 1);
        assert!(drain(&mut laptop_rx).is_empty());
    }

    #[test]
    fn test_second_role_notifies_first_exactly_once() {
        let dir = SessionDirectory::new();
        let (laptop, mut laptop_rx) = conn();
        let (mobile, mut mobile_rx) = conn();

        dir.join(sid("abc123"), Role::laptop(), laptop);
        let outcome = dir.join(sid("abc123"), Role::mobile(), mobile);

        assert!(!outcome.created_session);
        assert_eq!(outcome.notified, 1);
        assert_eq!(
            drain(&mut laptop_rx),
            vec![ServerMessage::DeviceConnected {
                role: Role::mobile()
            }]
        );
        // The joiner is not told about participants that were already there.
        assert!(drain(&mut mobile_rx).is_empty());
    }

    #[test]
    fn test_resolve_returns_other_participant() {
        let dir = SessionDirectory::new();
        let (laptop, _laptop_rx) = conn();
        let (mobile, _mobile_rx) = conn();
        let (laptop_id, mobile_id) = (laptop.id(), mobile.id());
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile);

        assert_eq!(dir.resolve(&sid("s"), mobile_id).map(|h| h.id()), Some(laptop_id));
        assert_eq!(dir.resolve(&sid("s"), laptop_id).map(|h| h.id()), Some(mobile_id));
    }

    #[test]
    fn test_resolve_without_peer_is_none() {
        let dir = SessionDirectory::new();
        let (mobile, _rx) = conn();
        let mobile_id = mobile.id();
        dir.join(sid("s"), Role::mobile(), mobile);

        assert!(dir.resolve(&sid("s"), mobile_id).is_none());
    }

    #[test]
    fn test_resolve_rejects_sender_from_other_session() {
        let dir = SessionDirectory::new();
        let (a1, _) = conn();
        let (a2, _) = conn();
        let (intruder, _) = conn();
        let intruder_id = intruder.id();
        dir.join(sid("a"), Role::laptop(), a1);
        dir.join(sid("a"), Role::mobile(), a2);
        dir.join(sid("b"), Role::mobile(), intruder);

        assert!(dir.resolve(&sid("a"), intruder_id).is_none());
    }

    #[test]
    fn test_rejoin_same_role_displaces_previous_connection() {
        let dir = SessionDirectory::new();
        let (laptop, _laptop_rx) = conn();
        let (old_mobile, mut old_rx) = conn();
        let (new_mobile, _new_rx) = conn();
        let (laptop_id, old_id, new_id) = (laptop.id(), old_mobile.id(), new_mobile.id());

        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), old_mobile);
        let outcome = dir.join(sid("s"), Role::mobile(), new_mobile);

        assert_eq!(outcome.displaced, Some(old_id));
        assert_eq!(dir.resolve(&sid("s"), laptop_id).map(|h| h.id()), Some(new_id));
        // The displaced connection can no longer route anything.
        assert!(dir.resolve(&sid("s"), old_id).is_none());
        assert!(dir.registration(old_id).is_none());
        // No eviction notice was sent to it.
        assert!(drain(&mut old_rx).is_empty());
    }

    #[test]
    fn test_displaced_connection_leave_keeps_replacement() {
        let dir = SessionDirectory::new();
        let (old_mobile, _) = conn();
        let (new_mobile, _) = conn();
        let (old_id, new_id) = (old_mobile.id(), new_mobile.id());
        dir.join(sid("s"), Role::mobile(), old_mobile);
        dir.join(sid("s"), Role::mobile(), new_mobile);

        assert!(dir.leave(old_id).is_none());
        assert_eq!(
            dir.registration(new_id).map(|r| r.role),
            Some(Role::mobile())
        );
        assert_eq!(dir.participant_count(&sid("s")), 1);
    }

    #[test]
    fn test_leave_notifies_remaining_participant() {
        let dir = SessionDirectory::new();
        let (laptop, mut laptop_rx) = conn();
        let (mobile, _) = conn();
        let mobile_id = mobile.id();
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile);
        drain(&mut laptop_rx);

        let outcome = dir.leave(mobile_id).expect("mobile was registered");

        assert_eq!(outcome.role, Role::mobile());
        assert!(!outcome.session_removed);
        assert_eq!(
            drain(&mut laptop_rx),
            vec![ServerMessage::DeviceDisconnected {
                role: Role::mobile()
            }]
        );
    }

    #[test]
    fn test_leave_without_departure_notices_is_silent() {
        let dir = SessionDirectory::new().with_departure_notices(false);
        let (laptop, mut laptop_rx) = conn();
        let (mobile, _) = conn();
        let mobile_id = mobile.id();
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile);
        drain(&mut laptop_rx);

        let outcome = dir.leave(mobile_id).unwrap();

        assert_eq!(outcome.notified, 0);
        assert!(drain(&mut laptop_rx).is_empty());
    }

    #[test]
    fn test_last_leave_removes_session() {
        let dir = SessionDirectory::new();
        let (laptop, _) = conn();
        let (mobile, _) = conn();
        let (laptop_id, mobile_id) = (laptop.id(), mobile.id());
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile);

        assert!(!dir.leave(laptop_id).unwrap().session_removed);
        assert!(dir.leave(mobile_id).unwrap().session_removed);
        assert_eq!(dir.session_count(), 0);
        assert_eq!(dir.connection_count(), 0);
    }

    #[test]
    fn test_leave_unknown_connection_is_none() {
        let dir = SessionDirectory::new();
        assert!(dir.leave(ConnectionId::new()).is_none());
    }

    #[test]
    fn test_after_leave_peer_events_resolve_to_nothing() {
        let dir = SessionDirectory::new();
        let (laptop, _) = conn();
        let (mobile, _) = conn();
        let (laptop_id, mobile_id) = (laptop.id(), mobile.id());
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile);

        dir.leave(laptop_id);

        assert!(dir.resolve(&sid("s"), mobile_id).is_none());
    }

    #[test]
    fn test_joining_another_session_releases_previous_slot() {
        let dir = SessionDirectory::new();
        let (laptop, mut laptop_rx) = conn();
        let (mobile, _) = conn();
        let mobile_id = mobile.id();
        dir.join(sid("a"), Role::laptop(), laptop);
        dir.join(sid("a"), Role::mobile(), mobile.clone());
        drain(&mut laptop_rx);

        dir.join(sid("b"), Role::mobile(), mobile);

        assert_eq!(dir.participant_count(&sid("a")), 1);
        assert_eq!(dir.registration(mobile_id).unwrap().session_id, sid("b"));
        assert_eq!(
            drain(&mut laptop_rx),
            vec![ServerMessage::DeviceDisconnected {
                role: Role::mobile()
            }]
        );
    }

    #[test]
    fn test_repeated_identical_join_keeps_single_slot() {
        let dir = SessionDirectory::new();
        let (laptop, mut laptop_rx) = conn();
        let (mobile, _) = conn();
        dir.join(sid("s"), Role::laptop(), laptop);
        dir.join(sid("s"), Role::mobile(), mobile.clone());
        let outcome = dir.join(sid("s"), Role::mobile(), mobile);

        assert_eq!(outcome.displaced, None);
        assert_eq!(dir.participant_count(&sid("s")), 2);
        // Each join declaration is announced, like the first one was.
        assert_eq!(drain(&mut laptop_rx).len(), 2);
    }

    #[test]
    fn test_notification_to_full_queue_is_dropped() {
        let dir = SessionDirectory::new();
        let (tx, _rx) = mpsc::channel(1);
        let laptop = ConnectionHandle::new(ConnectionId::new(), tx);
        laptop.deliver(ServerMessage::CursorClick);
        dir.join(sid("s"), Role::laptop(), laptop);
        let (mobile, _) = conn();

        let outcome = dir.join(sid("s"), Role::mobile(), mobile);

        assert_eq!(outcome.notified, 0);
    }

    #[test]
    fn test_deliver_to_dropped_receiver_reports_closed() {
        let (handle, rx) = conn();
        drop(rx);
        assert_eq!(handle.deliver(ServerMessage::CursorClick), Delivery::Closed);
    }
}
