//! WebSocket connection from a peer to the relay.
//!
//! Architecture:
//! - `PeerConnection` owns the write half of the WebSocket and encodes
//!   outbound [`ClientMessage`]s as JSON text frames.
//! - A background task owns the read half, decodes inbound
//!   [`ServerMessage`]s, and forwards them as [`PeerEvent`]s on an `mpsc`
//!   channel.
//! - Keepalive Pings from the relay are answered by tungstenite while the
//!   read half is being polled.

use cursorlink_core::{
    decode_server_message, encode_client_message, ClientMessage, ProtocolError, Role,
    ServerMessage, SessionId,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    connect_async, tungstenite::Error as WsError, tungstenite::Message as WsMessage,
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

/// Capacity of the inbound event channel handed to the caller.
const EVENT_QUEUE: usize = 128;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors that can occur on the peer's relay connection.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The WebSocket handshake with the relay failed.
    #[error("failed to connect to relay at {url}: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: WsError,
    },
    /// Writing a frame to the relay failed.
    #[error("send failed: {0}")]
    Send(#[source] WsError),
    /// An outbound message could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Events delivered from the relay to the application layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// A message forwarded or emitted by the relay.
    MessageReceived(ServerMessage),
    /// The connection ended.  No further events follow.
    Disconnected,
}

/// A live connection to the relay, bound to one session token.
pub struct PeerConnection {
    session_id: SessionId,
    sink: SplitSink<WsStream, WsMessage>,
    reader: JoinHandle<()>,
}

impl PeerConnection {
    /// Opens a WebSocket to `url` and starts the background reader.
    ///
    /// The returned receiver yields every [`PeerEvent`] from the relay and
    /// ends with [`PeerEvent::Disconnected`].  Nothing is sent until
    /// [`join`](Self::join) is called.
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::ConnectFailed`] if the TCP connect or WebSocket
    /// upgrade fails.
    pub async fn connect(
        url: &str,
        session_id: SessionId,
    ) -> Result<(Self, mpsc::Receiver<PeerEvent>), PeerError> {
        let (ws, _response) =
            connect_async(url)
                .await
                .map_err(|source| PeerError::ConnectFailed {
                    url: url.to_string(),
                    source,
                })?;
        info!("connected to relay at {url}");

        let (sink, stream) = ws.split();
        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let reader = tokio::spawn(read_loop(stream, tx));

        Ok((
            Self {
                session_id,
                sink,
                reader,
            },
            rx,
        ))
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Announces this peer's role in the session.
    pub async fn join(&mut self, role: Role) -> Result<(), PeerError> {
        info!("joining session {} as {role}", self.session_id);
        let msg = ClientMessage::Join {
            session_id: self.session_id.clone(),
            role,
        };
        self.send(&msg).await
    }

    pub async fn send_move(&mut self, dx: f64, dy: f64) -> Result<(), PeerError> {
        let msg = ClientMessage::CursorMove {
            session_id: self.session_id.clone(),
            dx,
            dy,
        };
        self.send(&msg).await
    }

    pub async fn send_click(&mut self) -> Result<(), PeerError> {
        let msg = ClientMessage::CursorClick {
            session_id: self.session_id.clone(),
        };
        self.send(&msg).await
    }

    /// Sends a Close frame and stops the reader.
    pub async fn close(mut self) {
        if let Err(e) = self.sink.close().await {
            debug!("close handshake failed: {e}");
        }
    }

    async fn send(&mut self, msg: &ClientMessage) -> Result<(), PeerError> {
        let text = encode_client_message(msg)?;
        debug!("-> {}", msg.kind());
        self.sink
            .send(WsMessage::Text(text))
            .await
            .map_err(PeerError::Send)
    }
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Decodes inbound frames and forwards them on `tx` until the socket ends
/// or the receiver is dropped.
async fn read_loop(mut stream: SplitStream<WsStream>, tx: mpsc::Sender<PeerEvent>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match decode_server_message(&text) {
                Ok(msg) => {
                    debug!("<- {}", msg.kind());
                    if tx.send(PeerEvent::MessageReceived(msg)).await.is_err() {
                        return;
                    }
                }
                Err(e) => warn!("ignoring undecodable frame from relay: {e}"),
            },
            Ok(WsMessage::Close(_)) => break,
            // Ping/Pong are handled by tungstenite; binary frames are not part
            // of the protocol.
            Ok(_) => {}
            Err(e) => {
                warn!("relay connection error: {e}");
                break;
            }
        }
    }
    info!("disconnected from relay");
    let _ = tx.send(PeerEvent::Disconnected).await;
}
