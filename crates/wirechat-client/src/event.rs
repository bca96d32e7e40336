//! Controller inputs and outputs.

use wirechat_proto::ChatMessage;

use crate::{error::SessionError, session::ConnectionId};

/// Events the transport feeds into the controller.
///
/// Every event names the connection it came from. Events for a connection
/// the controller no longer owns are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established.
    Opened(ConnectionId),

    /// Text frame received.
    Frame {
        /// Source connection.
        connection: ConnectionId,
        /// Frame text exactly as received.
        text: String,
    },

    /// Connection-level error. Does not imply the connection closed.
    Error {
        /// Source connection.
        connection: ConnectionId,
        /// Error description.
        message: String,
    },

    /// Connection closed, by either side.
    Closed(ConnectionId),
}

impl TransportEvent {
    /// Connection this event belongs to.
    pub fn connection(&self) -> ConnectionId {
        match self {
            Self::Opened(connection) | Self::Closed(connection) => *connection,
            Self::Frame { connection, .. } | Self::Error { connection, .. } => *connection,
        }
    }
}

/// Actions the controller produces for the caller to execute.
///
/// Transport actions (`Open`, `Send`, `Close`) go to the driver; the rest go
/// to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a new connection to `endpoint` under this id.
    Open {
        /// Handle for the new connection.
        connection: ConnectionId,
        /// Server URL.
        endpoint: String,
    },

    /// Send a text frame.
    Send {
        /// Target connection.
        connection: ConnectionId,
        /// Frame text.
        frame: String,
    },

    /// Close a connection.
    Close {
        /// Connection to close.
        connection: ConnectionId,
        /// Reason for closing, for logs.
        reason: String,
    },

    /// Display a chat message.
    RenderMessage(ChatMessage),

    /// Display a status line.
    ReportStatus {
        /// Status text.
        text: String,
        /// Render as an error.
        is_error: bool,
    },

    /// Display an error as a status line.
    ReportError(SessionError),

    /// Enable or disable the message input.
    SetSendingEnabled(bool),

    /// Clear the pending message text.
    ClearPendingText,
}

impl SessionAction {
    /// Informational status line.
    pub fn status(text: impl Into<String>) -> Self {
        Self::ReportStatus { text: text.into(), is_error: false }
    }

    /// Whether this action must be executed by the transport driver.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Send { .. } | Self::Close { .. })
    }
}
