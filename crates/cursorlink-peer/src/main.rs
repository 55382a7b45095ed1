//! cursorlink peer entry point.
//!
//! Runs one side of a session against a cursorlink relay.
//!
//! # Modes
//!
//! ```text
//! cursorlink-peer [--server <URL>] display  [--session <TOKEN>] [--role laptop] [--width 800] [--height 600]
//! cursorlink-peer [--server <URL>] touchpad  --session <TOKEN>  [--role mobile] [--sensitivity 2.5]
//! ```
//!
//! - **display** joins as the controller, generates a session token when none
//!   is given, and tracks a virtual cursor from the movement it receives.
//! - **touchpad** joins as the surface and turns commands read from stdin
//!   (`move`, `touch`, `drag`, `release`, `click`, `quit`) into events.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ PeerConnection::connect()   -- WebSocket + background reader
//!  └─ join(role)
//!  └─ event loop
//!       ├─ display:  PeerEvent -> CursorTracker
//!       └─ touchpad: stdin line -> TouchpadCommand -> TouchTracker -> relay
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cursorlink_core::{roles, Role, ServerMessage, SessionId};
use cursorlink_peer::application::{
    cursor_tracker::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH},
    touch_tracker::DEFAULT_SENSITIVITY,
    CommandError, CursorTracker, TouchTracker, TouchpadCommand,
};
use cursorlink_peer::infrastructure::{PeerConnection, PeerError, PeerEvent};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "cursorlink-peer",
    about = "Drive or display a remote cursor through a cursorlink relay",
    version
)]
struct Cli {
    /// WebSocket URL of the relay.
    #[arg(
        long,
        env = "CURSORLINK_SERVER",
        default_value = "ws://localhost:3001",
        global = true
    )]
    server: String,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Show a virtual cursor driven by a touchpad peer.
    Display {
        /// Session token to join; a fresh one is generated when omitted.
        #[arg(long)]
        session: Option<String>,

        #[arg(long, default_value = roles::LAPTOP)]
        role: String,

        /// Surface width in pixels.
        #[arg(long, default_value_t = DEFAULT_SURFACE_WIDTH)]
        width: f64,

        /// Surface height in pixels.
        #[arg(long, default_value_t = DEFAULT_SURFACE_HEIGHT)]
        height: f64,
    },
    /// Send movement and clicks read from stdin.
    Touchpad {
        /// Session token shown by the display peer.
        #[arg(long)]
        session: String,

        #[arg(long, default_value = roles::MOBILE)]
        role: String,

        /// Multiplier applied to `drag` movement.
        #[arg(long, default_value_t = DEFAULT_SENSITIVITY, value_parser = parse_sensitivity)]
        sensitivity: f64,
    },
}

/// Accepts a finite, strictly positive drag multiplier.
fn parse_sensitivity(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("`{raw}` is not a number: {e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("`{raw}` must be a finite number greater than zero"))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Display {
            session,
            role,
            width,
            height,
        } => {
            let session_id = session.map(SessionId::new).unwrap_or_else(SessionId::generate);
            run_display(&cli.server, session_id, Role::new(role), CursorTracker::new(width, height))
                .await
        }
        Mode::Touchpad {
            session,
            role,
            sensitivity,
        } => {
            run_touchpad(
                &cli.server,
                SessionId::new(session),
                Role::new(role),
                TouchTracker::new(sensitivity),
            )
            .await
        }
    }
}

// ── Display mode ──────────────────────────────────────────────────────────────

async fn run_display(
    server: &str,
    session_id: SessionId,
    role: Role,
    mut tracker: CursorTracker,
) -> anyhow::Result<()> {
    info!("session: {session_id}");
    info!("pair a touchpad with: cursorlink-peer --server {server} touchpad --session {session_id}");

    let (mut conn, mut events) = PeerConnection::connect(server, session_id).await?;
    info!("joining session {} as {role}", conn.session_id());
    conn.join(role).await?;
    info!("waiting for a touchpad to join");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PeerEvent::MessageReceived(msg)) => render(&mut tracker, msg),
                Some(PeerEvent::Disconnected) | None => {
                    warn!("relay connection lost");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    conn.close().await;
    Ok(())
}

fn render(tracker: &mut CursorTracker, msg: ServerMessage) {
    match msg {
        ServerMessage::DeviceConnected { role } => {
            // A newly paired touchpad starts from the centre.
            tracker.reset();
            info!("{role} connected");
        }
        ServerMessage::DeviceDisconnected { role } => info!("{role} disconnected"),
        ServerMessage::CursorMove { dx, dy } => {
            let at = tracker.apply_move(dx, dy);
            info!("cursor ({:.1}, {:.1})", at.x, at.y);
        }
        ServerMessage::CursorClick => {
            let at = tracker.click();
            info!("click #{} at ({:.1}, {:.1})", tracker.click_count(), at.x, at.y);
        }
    }
}

// ── Touchpad mode ─────────────────────────────────────────────────────────────

async fn run_touchpad(
    server: &str,
    session_id: SessionId,
    role: Role,
    mut touch: TouchTracker,
) -> anyhow::Result<()> {
    let (mut conn, mut events) = PeerConnection::connect(server, session_id).await?;
    info!(
        "joining session {} as {role} (drag sensitivity {})",
        conn.session_id(),
        touch.sensitivity()
    );
    conn.join(role).await?;
    info!("commands: move <dx> <dy> | touch <x> <y> | drag <x> <y> | release | click | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match line.parse::<TouchpadCommand>() {
                    Ok(TouchpadCommand::Quit) => break,
                    Ok(command) => apply_command(&mut conn, &mut touch, command).await?,
                    Err(CommandError::Empty) => {}
                    Err(e) => warn!("{e}"),
                }
            }
            event = events.recv() => match event {
                Some(PeerEvent::MessageReceived(ServerMessage::DeviceConnected { role })) => {
                    info!("{role} connected");
                }
                Some(PeerEvent::MessageReceived(ServerMessage::DeviceDisconnected { role })) => {
                    info!("{role} disconnected");
                }
                Some(PeerEvent::MessageReceived(other)) => info!("received {}", other.kind()),
                Some(PeerEvent::Disconnected) | None => {
                    warn!("relay connection lost");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    conn.close().await;
    Ok(())
}

async fn apply_command(
    conn: &mut PeerConnection,
    touch: &mut TouchTracker,
    command: TouchpadCommand,
) -> Result<(), PeerError> {
    match command {
        TouchpadCommand::Move { dx, dy } => match finite_delta(dx, dy) {
            Some((dx, dy)) => conn.send_move(dx, dy).await,
            None => Ok(()),
        },
        TouchpadCommand::Touch { x, y } => {
            touch.touch_start(x, y);
            Ok(())
        }
        TouchpadCommand::Drag { x, y } => {
            match touch.touch_move(x, y).and_then(|(dx, dy)| finite_delta(dx, dy)) {
                Some((dx, dy)) => conn.send_move(dx, dy).await,
                None => Ok(()),
            }
        }
        TouchpadCommand::Release => {
            touch.touch_end();
            Ok(())
        }
        TouchpadCommand::Click => conn.send_click().await,
        TouchpadCommand::Quit => Ok(()),
    }
}

/// Passes a delta through only when both components are finite.
///
/// JSON has no encoding for NaN or infinity; serde_json writes them as
/// `null`, which the relay would reject as a malformed frame.
fn finite_delta(dx: f64, dy: f64) -> Option<(f64, f64)> {
    if dx.is_finite() && dy.is_finite() {
        Some((dx, dy))
    } else {
        warn!("dropping non-finite movement ({dx}, {dy})");
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
