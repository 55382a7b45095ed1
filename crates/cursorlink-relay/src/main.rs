//! cursorlink relay entry point.
//!
//! Accepts WebSocket connections from peers, pairs them by session token, and
//! forwards movement and click events between the two participants of each
//! session.
//!
//! # Usage
//!
//! ```text
//! cursorlink-relay [OPTIONS]
//!
//! Options:
//!   --port <PORT>                 Listener port [default: 3001]
//!   --bind <IP>                   Listener address [default: 0.0.0.0]
//!   --config <FILE>               Optional TOML config file
//!   --outbound-queue <N>          Per-connection outbound queue [default: 128]
//!   --ping-interval <SECS>        WebSocket keepalive interval [default: 25]
//!   --ping-timeout <SECS>         Extra grace before a silent peer is dropped [default: 20]
//!   --notify-departures <BOOL>    Send device-disconnected on leave [default: true]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                        | Flag                  |
//! |---------------------------------|-----------------------|
//! | `PORT`                          | `--port`              |
//! | `CURSORLINK_BIND`               | `--bind`              |
//! | `CURSORLINK_CONFIG`             | `--config`            |
//! | `CURSORLINK_OUTBOUND_QUEUE`     | `--outbound-queue`    |
//! | `CURSORLINK_PING_INTERVAL`      | `--ping-interval`     |
//! | `CURSORLINK_PING_TIMEOUT`       | `--ping-timeout`      |
//! | `CURSORLINK_NOTIFY_DEPARTURES`  | `--notify-departures` |
//!
//! Precedence: CLI flag, then environment variable, then config file, then
//! the built-in default.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cursorlink_relay::domain::{
    RelayConfig, DEFAULT_OUTBOUND_QUEUE, DEFAULT_PORT, MAX_OUTBOUND_QUEUE, MAX_PING_SECS,
};
use cursorlink_relay::infrastructure::net_info::{banner_lines, lan_ipv4};
use cursorlink_relay::infrastructure::{run_server, RelayFileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// cursorlink relay.
///
/// Pairs a touchpad device and a display device under a shared session token
/// and relays cursor events between them.
#[derive(Debug, Parser)]
#[command(
    name = "cursorlink-relay",
    about = "Session relay pairing a phone touchpad with a screen",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// IP address to bind the listener to (`0.0.0.0` = all interfaces).
    #[arg(long, env = "CURSORLINK_BIND")]
    bind: Option<IpAddr>,

    /// Path to a TOML config file.
    #[arg(long, env = "CURSORLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Frames that may wait in each connection's outbound queue.
    #[arg(long, env = "CURSORLINK_OUTBOUND_QUEUE", value_parser = clap::value_parser!(u64).range(1..=MAX_OUTBOUND_QUEUE as u64))]
    outbound_queue: Option<u64>,

    /// Seconds between keepalive Pings.
    #[arg(long, env = "CURSORLINK_PING_INTERVAL", value_parser = clap::value_parser!(u64).range(1..=MAX_PING_SECS))]
    ping_interval: Option<u64>,

    /// Extra seconds of silence tolerated after a ping before closing.
    #[arg(long, env = "CURSORLINK_PING_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..=MAX_PING_SECS))]
    ping_timeout: Option<u64>,

    /// Whether remaining participants receive `device-disconnected`.
    #[arg(long, env = "CURSORLINK_NOTIFY_DEPARTURES")]
    notify_departures: Option<bool>,
}

impl Cli {
    /// Merges the CLI arguments over `file` and the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged queue size does not fit in `usize`.
    fn into_relay_config(self, file: RelayFileConfig) -> anyhow::Result<RelayConfig> {
        let defaults = RelayConfig::default();

        let port = self.port.or(file.port).unwrap_or(DEFAULT_PORT);
        let ip = self.bind.or(file.bind).unwrap_or(defaults.bind_addr.ip());

        let outbound_queue = match self.outbound_queue {
            Some(n) => usize::try_from(n).context("--outbound-queue is too large")?,
            None => file.outbound_queue.unwrap_or(DEFAULT_OUTBOUND_QUEUE),
        };

        let ping_interval = self
            .ping_interval
            .or(file.ping_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.ping_interval);
        let ping_timeout = self
            .ping_timeout
            .or(file.ping_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.ping_timeout);

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, port),
            outbound_queue,
            ping_interval,
            ping_timeout,
            notify_departures: self
                .notify_departures
                .or(file.notify_departures)
                .unwrap_or(defaults.notify_departures),
        })
    }

    /// Loads the config file named by `--config`, or an empty one.
    fn load_file(&self) -> anyhow::Result<RelayFileConfig> {
        match &self.config {
            Some(path) => RelayFileConfig::load(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            None => Ok(RelayFileConfig::default()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG; default to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let file = cli.load_file()?;
    let config = cli.into_relay_config(file)?;

    info!("=================================");
    info!("cursorlink relay starting");
    for line in banner_lines(config.bind_addr, lan_ipv4()) {
        info!("{line}");
    }
    info!("=================================");

    // Cleared by the Ctrl+C handler; the accept loop polls it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("cursorlink relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
