//! Transport seam between the connection manager and the network.
//!
//! The manager never touches `tokio-tungstenite` directly: it talks to a
//! [`TransportSession`] (write half + close) and consumes a stream of
//! [`TransportEvent`]s (open/message/close). A [`Connector`] opens sessions.
//! Tests inject a fake connector and drive the state machine without a
//! real socket; production code uses [`WsConnector`].

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Errors surfaced by the transport seam.
///
/// These never cross into subscriber or caller code; the manager absorbs
/// them into logs and the close notification path.
#[derive(Debug)]
pub enum TransportError {
    /// The session could not be constructed at all (e.g. malformed target).
    Construction(String),
    /// The session's writer task is gone; no more frames can be queued.
    SessionGone,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Construction(msg) => write!(f, "transport construction failed: {msg}"),
            Self::SessionGone => write!(f, "transport session is gone"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Events emitted by one transport session, in occurrence order.
#[derive(Debug)]
pub enum TransportEvent {
    /// Handshake completed; the session can carry frames.
    Opened,
    /// One inbound text frame.
    Message(String),
    /// The session ended: server close, read/write error, or failed
    /// handshake. Terminal for this session.
    Closed,
}

/// Write half of one live transport session.
///
/// Implementations must make both methods non-blocking: frames queue to a
/// writer task, they are not flushed inline.
pub trait TransportSession: Send + Sync + 'static {
    /// Queue one text frame for write.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SessionGone`] when the session has ended.
    fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Close the session. Idempotent; further sends fail.
    fn close(&self);
}

/// Opens transport sessions toward a target address.
///
/// `connect` must return immediately: handshake completion is reported
/// asynchronously via [`TransportEvent::Opened`] on the returned receiver.
pub trait Connector: Send + Sync + 'static {
    /// Open a new session toward `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Construction`] only for failures detectable
    /// synchronously (e.g. an unparseable URL). Network-level handshake
    /// failures surface later as [`TransportEvent::Closed`].
    fn connect(
        &self,
        url: &str,
    ) -> Result<
        (Box<dyn TransportSession>, mpsc::UnboundedReceiver<TransportEvent>),
        TransportError,
    >;
}

/// Command queued to the WebSocket writer task.
#[derive(Debug)]
enum WriteCommand {
    Frame(String),
    Close,
}

/// Production session handle over a `tokio-tungstenite` stream.
#[derive(Debug)]
struct WsSession {
    commands: mpsc::UnboundedSender<WriteCommand>,
}

impl TransportSession for WsSession {
    fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.commands
            .send(WriteCommand::Frame(text.to_string()))
            .map_err(|_| TransportError::SessionGone)
    }

    fn close(&self) {
        // Ignore failure: the driver already exited, which is as closed
        // as it gets.
        let _ = self.commands.send(WriteCommand::Close);
    }
}

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Each `connect` spawns a driver task that performs the handshake, pumps
/// frames in both directions, answers protocol pings with pongs, and emits
/// a single terminal [`TransportEvent::Closed`].
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn connect(
        &self,
        url: &str,
    ) -> Result<
        (Box<dyn TransportSession>, mpsc::UnboundedReceiver<TransportEvent>),
        TransportError,
    > {
        // URL problems are the synchronous construction failure case.
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::Construction(format!("invalid WebSocket URL: {e}")))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(drive_session(request, command_rx, event_tx));

        Ok((Box::new(WsSession { commands: command_tx }), event_rx))
    }
}

/// Handshake, then pump frames until either side ends the session.
async fn drive_session(
    request: tokio_tungstenite::tungstenite::handshake::client::Request,
    mut commands: mpsc::UnboundedReceiver<WriteCommand>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let ws_stream = match connect_async(request).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            log::warn!("WebSocket handshake failed: {e}");
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };

    if events.send(TransportEvent::Opened).is_err() {
        // Manager went away between connect and handshake.
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(WriteCommand::Frame(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        log::error!("WebSocket write failed: {e}");
                        break;
                    }
                }
                // None: the session handle was dropped; treat like close.
                Some(WriteCommand::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(TransportEvent::Message(text)).is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if write.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    log::info!("WebSocket closed by server");
                    break;
                }
                Some(Err(e)) => {
                    log::error!("WebSocket read error: {e}");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = events.send(TransportEvent::Closed);
}
