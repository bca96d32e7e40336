//! Error types for the session controller.
//!
//! Every variant is terminal at the session boundary: the controller reports
//! it to the presentation layer as a
//! [`SessionAction::ReportError`](crate::SessionAction::ReportError) and never
//! returns it as `Err` from a public operation. Undecodable inbound frames
//! are not errors at all; they are downgraded to informational statuses.

use std::time::Duration;

use thiserror::Error;
use wirechat_proto::CodecError;

/// Errors reported by the session controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Username or password missing. No connection was attempted.
    #[error("please enter both username and password")]
    Validation,

    /// Chat message sent outside an authenticated session.
    #[error("not authenticated, please connect first")]
    NotAuthenticated,

    /// Connection-level failure reported by the transport
    #[error("transport error: {0}")]
    Transport(String),

    /// Server answered the login with the failure sentinel
    #[error("authentication failed")]
    AuthenticationRejected,

    /// No authentication outcome arrived within the configured timeout
    #[error("no response from server after {elapsed:?}")]
    HandshakeTimeout {
        /// How long we waited
        elapsed: Duration,
    },

    /// Outbound frame could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}

impl SessionError {
    /// Returns true if a fresh attempt with the same input may succeed.
    ///
    /// Validation, authorization and rejection errors need different input
    /// from the user; timeouts and transport failures do not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HandshakeTimeout { .. })
    }
}

impl From<CodecError> for SessionError {
    fn from(err: CodecError) -> Self {
        Self::Encode(err.to_string())
    }
}
