//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments, environment variables, and
//! an optional TOML file (see `main.rs` and
//! [`crate::infrastructure::config_file`]), then shared read-only with every
//! connection task.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Port the relay listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 3001;

/// Capacity of each connection's outbound queue when nothing else is configured.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 128;

/// Largest accepted outbound queue capacity.
pub const MAX_OUTBOUND_QUEUE: usize = 65_536;

/// Largest accepted ping interval or ping timeout, in seconds.
pub const MAX_PING_SECS: u64 = 86_400;

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use cursorlink_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 3001);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts connections on every interface, which is what a
    /// phone on the same Wi-Fi network needs to reach the relay.
    pub bind_addr: SocketAddr,

    /// Number of frames that may wait in a connection's outbound queue.
    ///
    /// When a slow receiver lets its queue fill up, further events addressed
    /// to it are dropped rather than buffered without bound.
    pub outbound_queue: usize,

    /// How often the relay sends a WebSocket Ping to each connection.
    pub ping_interval: Duration,

    /// Extra grace period after a missed ping before the connection is
    /// considered dead.
    ///
    /// A connection that sends no frame at all (not even a Pong) for
    /// `ping_interval + ping_timeout` is closed and removed from its session.
    pub ping_timeout: Duration,

    /// Whether the remaining participant receives `device-disconnected` when
    /// its peer leaves.
    pub notify_departures: bool,
}

impl RelayConfig {
    /// Maximum silence tolerated on a connection before it is torn down.
    pub fn idle_timeout(&self) -> Duration {
        self.ping_interval.saturating_add(self.ping_timeout)
    }

    /// Outbound queue capacity actually used for a connection channel.
    ///
    /// Clamped to `1..=MAX_OUTBOUND_QUEUE`; tokio rejects a zero-sized or
    /// oversized channel with a panic.
    pub fn queue_capacity(&self) -> usize {
        self.outbound_queue.clamp(1, MAX_OUTBOUND_QUEUE)
    }
}

impl Default for RelayConfig {
    /// | Field             | Default         |
    /// |-------------------|-----------------|
    /// | bind_addr         | `0.0.0.0:3001`  |
    /// | outbound_queue    | 128             |
    /// | ping_interval     | 25 seconds      |
    /// | ping_timeout      | 20 seconds      |
    /// | notify_departures | `true`          |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(20),
            notify_departures: true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
