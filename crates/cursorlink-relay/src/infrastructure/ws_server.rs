//! WebSocket server: accept loop and per-connection task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections and upgrading them to WebSocket.
//!    Any `Origin` is accepted; restricting origins is a deployment concern.
//! 3. Running two halves per connection:
//!    - **Reader** (in the connection task): decodes JSON text frames and
//!      feeds them to the connection's [`ConnectionLifecycle`].
//!    - **Writer** (a spawned task): drains the connection's outbound queue
//!      into the socket and sends keepalive Pings.
//! 4. Removing the connection from the [`SessionDirectory`] when either half
//!    ends (close frame, network error, idle timeout, write failure).
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Why a queue per connection?
//!
//! The router must never wait on a slow or dead peer.  Forwarding an event is
//! a `try_send` into the destination's bounded queue; only that
//! destination's writer task ever touches its socket.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, trace, warn};

use cursorlink_core::{decode_client_message, encode_server_message, ConnectionId, ServerMessage};

use crate::application::{
    ConnectionHandle, ConnectionLifecycle, Handled, RouteOutcome, SessionDirectory,
};
use crate::domain::config::RelayConfig;

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the relay listener and serves connections until `running` is
/// cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = bind_listener(&config).await?;
    let directory =
        Arc::new(SessionDirectory::new().with_departure_notices(config.notify_departures));
    serve(listener, config, directory, running).await
}

/// Binds the TCP listener described by `config.bind_addr`.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind_listener(config: &RelayConfig) -> anyhow::Result<TcpListener> {
    TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind relay listener on {}", config.bind_addr))
}

/// Runs the accept loop on an already-bound listener.
///
/// Each accepted connection is handed to its own Tokio task so that one slow
/// peer never delays the others.  Taking the listener and directory from the
/// caller lets tests bind port 0 and inspect the directory while the server
/// runs.
///
/// # Errors
///
/// Currently always returns `Ok`; accept errors are logged and skipped.
pub async fn serve(
    listener: TcpListener,
    config: RelayConfig,
    directory: Arc<SessionDirectory>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("relay listening on {addr}");
    }
    let config = Arc::new(config);

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short accept timeout so the loop notices the shutdown flag even when
        // nobody is connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let dir = Arc::clone(&directory);
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, cfg, dir).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

async fn handle_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    directory: Arc<SessionDirectory>,
) {
    match run_connection(raw_stream, peer_addr, config, directory).await {
        Ok(()) => debug!("connection {peer_addr} closed"),
        Err(e) => warn!("connection {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one peer connection.
///
/// # Errors
///
/// Returns an error if the WebSocket handshake fails or does not finish
/// within the idle timeout.
async fn run_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    directory: Arc<SessionDirectory>,
) -> anyhow::Result<()> {
    // A client that opens TCP but never sends the Upgrade request is given
    // the same grace as a silent established connection.
    let ws_stream = timeout(config.idle_timeout(), accept_async(raw_stream))
        .await
        .map_err(|_| anyhow::anyhow!("WebSocket handshake with {peer_addr} timed out"))?
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let conn_id = ConnectionId::new();
    let label = format!("{conn_id} ({peer_addr})");
    info!("connection {label} established");

    let (ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(config.queue_capacity());
    let mut lifecycle =
        ConnectionLifecycle::new(ConnectionHandle::new(conn_id, out_tx), directory);

    let mut writer_task = tokio::spawn(write_loop(
        ws_tx,
        out_rx,
        config.ping_interval,
        label.clone(),
    ));

    tokio::select! {
        _ = read_loop(&mut ws_rx, &mut lifecycle, config.idle_timeout(), &label) => {
            debug!("connection {label}: reader ended");
        }
        _ = &mut writer_task => {
            debug!("connection {label}: writer ended");
        }
    }

    // Leave the directory before the writer goes away so no event is routed
    // into a queue nobody drains.
    if let Some(left) = lifecycle.on_close() {
        debug!(
            "connection {label}: left session {} as {} (session removed: {})",
            left.session_id, left.role, left.session_removed
        );
    }
    writer_task.abort();
    info!("connection {label} closed");

    Ok(())
}

/// Reads frames until the peer closes, errors, or goes silent for
/// `idle_timeout`.
async fn read_loop(
    ws_rx: &mut WsSource,
    lifecycle: &mut ConnectionLifecycle,
    idle_timeout: Duration,
    label: &str,
) {
    loop {
        let next = match timeout(idle_timeout, ws_rx.next()).await {
            Ok(next) => next,
            Err(_) => {
                info!("connection {label}: no frames for {idle_timeout:?}, closing");
                break;
            }
        };

        let ws_msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("connection {label}: WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                warn!("connection {label}: WebSocket error: {e}");
                break;
            }
            None => {
                debug!("connection {label}: stream ended");
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(frame) => handle_text_frame(lifecycle, &frame, label),
            WsMessage::Binary(_) => {
                // The protocol is JSON-only.
                warn!("connection {label}: unexpected binary frame (ignored)");
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                // tokio-tungstenite answers Pings itself; either way the peer is alive.
                trace!("connection {label}: ping/pong");
            }
            WsMessage::Close(_) => {
                debug!("connection {label}: Close frame received");
                break;
            }
            WsMessage::Frame(_) => {}
        }
    }
}

/// Decodes one text frame and applies it to the connection.
///
/// Malformed frames are logged and dropped; they never close the connection.
fn handle_text_frame(lifecycle: &mut ConnectionLifecycle, frame: &str, label: &str) {
    let msg = match decode_client_message(frame) {
        Ok(m) => m,
        Err(e) => {
            warn!("connection {label}: dropping malformed frame: {e}");
            return;
        }
    };

    let kind = msg.kind();
    match lifecycle.on_message(msg) {
        Handled::Joined(outcome) => {
            debug!(
                "connection {label}: join handled (new session: {}, peers notified: {})",
                outcome.created_session, outcome.notified
            );
        }
        Handled::Routed(RouteOutcome::Forwarded) => {
            trace!("connection {label}: forwarded {kind}");
        }
        Handled::Routed(outcome) => {
            debug!("connection {label}: dropped {kind}: {outcome:?}");
        }
        Handled::Ignored => {}
    }
}

/// Drains the outbound queue into the socket and sends keepalive Pings.
async fn write_loop(
    mut ws_tx: WsSink,
    mut out_rx: mpsc::Receiver<ServerMessage>,
    ping_interval: Duration,
    label: String,
) {
    let mut ticker = interval(ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick resolves immediately; skip it.
    ticker.tick().await;

    loop {
        tokio::select! {
            msg = out_rx.recv() => {
                let Some(msg) = msg else { break };
                let frame = match encode_server_message(&msg) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("connection {label}: {e}");
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(WsMessage::Text(frame)).await {
                    debug!("connection {label}: send failed: {e}");
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = ws_tx.send(WsMessage::Ping(Vec::new())).await {
                    debug!("connection {label}: keepalive ping failed: {e}");
                    break;
                }
            }
        }
    }
}
