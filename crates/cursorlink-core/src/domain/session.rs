//! Session identity types: session tokens, participant roles, connection ids.
//!
//! All three are thin newtypes.  The relay never interprets a session token
//! or a role label: tokens are opaque correlation keys handed from one device
//! to the other out of band (QR code, URL), and roles are free-form labels
//! that only the peers attach meaning to.  The newtypes exist so the compiler
//! stops us from passing a role where a session token was expected.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters used by [`SessionId::generate`]: lowercase base-36.
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated session token.
pub const GENERATED_TOKEN_LEN: usize = 9;

/// Well-known role labels used by the reference peers.
///
/// The relay does not validate roles against this list; any string is a
/// valid role.
pub mod roles {
    /// The controller side: renders the cursor and click effects.
    pub const LAPTOP: &str = "laptop";
    /// The surface side: the touchpad that emits movement and clicks.
    pub const MOBILE: &str = "mobile";
}

// ── SessionId ─────────────────────────────────────────────────────────────────

/// Opaque session token shared by the two participants of a session.
///
/// Serialized as a bare JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generates a short random token suitable for pairing two devices.
    ///
    /// The token is [`GENERATED_TOKEN_LEN`] characters from `[a-z0-9]`.  It is
    /// meant to be unguessable enough to avoid accidental collisions on a
    /// shared relay, not to act as a credential.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token = (0..GENERATED_TOKEN_LEN)
            .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Role ──────────────────────────────────────────────────────────────────────

/// Free-form participant label distinguishing the slots of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn laptop() -> Self {
        Self::new(roles::LAPTOP)
    }

    pub fn mobile() -> Self {
        Self::new(roles::MOBILE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── ConnectionId ──────────────────────────────────────────────────────────────

/// Identity of one live transport connection on the relay.
///
/// Assigned by the relay when a connection is accepted; never sent on the
/// wire.  A peer that reconnects gets a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The first block of the UUID is plenty to tell connections apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
