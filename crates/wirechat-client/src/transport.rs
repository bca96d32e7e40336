//! WebSocket transport for the client.
//!
//! Provides [`WsConnection`], a handle to one WebSocket connection driven by a
//! background task. This is a thin layer that only moves text frames; protocol
//! logic stays in the Sans-IO [`SessionController`](crate::SessionController).
//!
//! Everything the connection observes is reported on a shared channel as
//! [`TransportEvent`]s tagged with the connection's id, always ending with
//! exactly one `Closed`.

use std::collections::HashMap;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::{
    event::{SessionAction, TransportEvent},
    session::ConnectionId,
};

/// Outbound frames buffered per connection before `send` fails.
const OUTGOING_CAPACITY: usize = 32;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// The connection task is gone or its outbound buffer is full.
    #[error("connection closed")]
    Closed,
}

/// Handle to one WebSocket connection.
///
/// Frames are queued with [`send`](Self::send) and written by the connection
/// task. [`close`](Self::close) performs a close handshake; dropping the handle
/// without closing aborts the task.
#[derive(Debug)]
pub struct WsConnection {
    id: ConnectionId,
    to_server: Option<mpsc::Sender<String>>,
    abort_handle: tokio::task::AbortHandle,
}

impl WsConnection {
    /// Id this connection reports its events under.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame for the server.
    pub fn send(&self, frame: String) -> Result<(), TransportError> {
        let to_server = self.to_server.as_ref().ok_or(TransportError::Closed)?;
        to_server.try_send(frame).map_err(|_| TransportError::Closed)
    }

    /// Close gracefully.
    ///
    /// Queued frames are written first, then a close frame. The task keeps
    /// running until the server acknowledges and reports `Closed` as usual.
    pub fn close(mut self) {
        // Dropping the sender is the close signal
        self.to_server = None;
    }

    /// Stop the connection task immediately.
    ///
    /// No `Closed` event is reported.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        if self.to_server.is_some() {
            self.abort_handle.abort();
        }
    }
}

/// Connection handles owned by a driver, keyed by id.
///
/// Executes the transport half of [`SessionAction`]s and lets go of a handle
/// as soon as it is closed, whether the controller asked for it or the
/// transport reported `Closed` on its own.
#[derive(Debug)]
pub struct ConnectionPool {
    events: mpsc::Sender<TransportEvent>,
    connections: HashMap<ConnectionId, WsConnection>,
}

impl ConnectionPool {
    /// Create an empty pool whose connections report on `events`.
    pub fn new(events: mpsc::Sender<TransportEvent>) -> Self {
        Self { events, connections: HashMap::new() }
    }

    /// Execute `Open`, `Send` or `Close`. Other actions are ignored.
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(&mut self, action: &SessionAction) -> Result<(), TransportError> {
        match action {
            SessionAction::Open { connection, endpoint } => {
                debug!(%connection, %endpoint, "opening connection");
                let handle = open(*connection, endpoint, self.events.clone());
                self.connections.insert(*connection, handle);
            },
            SessionAction::Send { connection, frame } => {
                let handle = self.connections.get(connection).ok_or(TransportError::Closed)?;
                handle.send(frame.clone())?;
            },
            SessionAction::Close { connection, reason } => {
                debug!(%connection, %reason, "closing connection");
                if let Some(handle) = self.connections.remove(connection) {
                    handle.close();
                }
            },
            _ => {},
        }
        Ok(())
    }

    /// Note an event delivered from the shared channel.
    ///
    /// Drops the handle of a connection that reported `Closed`.
    pub fn observe(&mut self, event: &TransportEvent) {
        if let TransportEvent::Closed(connection) = event
            && self.connections.remove(connection).is_some()
        {
            debug!(%connection, "released handle of closed connection");
        }
    }

    /// Number of handles held.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no handle is held.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Abort every connection task.
    pub fn stop_all(&mut self) {
        for (_, connection) in self.connections.drain() {
            connection.stop();
        }
    }
}

/// Open a connection to `endpoint`.
///
/// Returns immediately; the handshake runs on a spawned task that reports
/// `Opened` (or `Error` followed by `Closed`) on `events`. Must be called from
/// within a tokio runtime.
pub fn open(
    id: ConnectionId,
    endpoint: &str,
    events: mpsc::Sender<TransportEvent>,
) -> WsConnection {
    let (to_server_tx, to_server_rx) = mpsc::channel(OUTGOING_CAPACITY);
    let handle = tokio::spawn(run_connection(id, endpoint.to_string(), to_server_rx, events));

    WsConnection { id, to_server: Some(to_server_tx), abort_handle: handle.abort_handle() }
}

/// Run the connection, bridging between the channels and the socket.
async fn run_connection(
    id: ConnectionId,
    endpoint: String,
    mut to_server: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
) {
    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            let err = TransportError::Connection(err.to_string());
            warn!(connection = %id, %endpoint, error = %err, "connect failed");
            let _ = events.send(TransportEvent::Error { connection: id, message: err.to_string() }).await;
            let _ = events.send(TransportEvent::Closed(id)).await;
            return;
        },
    };

    debug!(connection = %id, %endpoint, "websocket open");
    if events.send(TransportEvent::Opened(id)).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            outgoing = to_server.recv(), if !closing => match outgoing {
                Some(frame) => {
                    if let Err(err) = sink.send(Message::text(frame)).await {
                        report(&events, id, TransportError::Stream(err.to_string())).await;
                        break;
                    }
                },
                None => {
                    closing = true;
                    if sink.send(Message::Close(None)).await.is_err() {
                        break;
                    }
                },
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let event = TransportEvent::Frame { connection: id, text: text.to_string() };
                    if events.send(event).await.is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Binary(data))) => {
                    warn!(connection = %id, bytes = data.len(), "ignoring binary frame");
                },
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {},
                Some(Err(err)) => {
                    report(&events, id, TransportError::Stream(err.to_string())).await;
                    break;
                },
            },
        }
    }

    debug!(connection = %id, "websocket closed");
    let _ = events.send(TransportEvent::Closed(id)).await;
}

async fn report(events: &mpsc::Sender<TransportEvent>, id: ConnectionId, err: TransportError) {
    warn!(connection = %id, error = %err, "websocket error");
    let _ = events.send(TransportEvent::Error { connection: id, message: err.to_string() }).await;
}
