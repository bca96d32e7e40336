//! Inbound frame classification.
//!
//! A login connection receives three kinds of frames: the two authentication
//! sentinels, and chat envelopes. Sentinels are compared by exact string
//! equality before any JSON decoding is attempted.

use crate::{ChatMessage, ParseFailure, decode_frame};

/// Sentinel sent by the server when login credentials are accepted.
pub const AUTH_SUCCESS: &str = "Authentication successful";

/// Sentinel sent by the server when login credentials are rejected.
pub const AUTH_FAILURE: &str = "Authentication failed";

/// Reply sent by the server when an account is created.
pub const REGISTRATION_SUCCESS: &str = "Registration successful";

/// Prefix of the reply sent by the server when an account cannot be created.
pub const REGISTRATION_FAILED_PREFIX: &str = "Registration failed";

/// Reply sent by the server when the first frame has an unknown `type`.
pub const INVALID_AUTH_TYPE: &str = "Invalid authentication type";

/// Largest inbound frame the codec will attempt to decode (64 KiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Authentication outcome signalled by a sentinel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSignal {
    /// Credentials accepted.
    Success,
    /// Credentials rejected.
    Failure,
}

impl AuthSignal {
    /// Match `text` exactly against the sentinels. `None` for anything else.
    pub fn from_sentinel(text: &str) -> Option<Self> {
        match text {
            AUTH_SUCCESS => Some(Self::Success),
            AUTH_FAILURE => Some(Self::Failure),
            _ => None,
        }
    }

    /// Sentinel text for this signal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => AUTH_SUCCESS,
            Self::Failure => AUTH_FAILURE,
        }
    }
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Authentication sentinel.
    Auth(AuthSignal),
    /// Decoded chat envelope.
    Chat(ChatMessage),
    /// Neither a sentinel nor a valid envelope.
    Unparsed(ParseFailure),
}

/// Classify an inbound frame.
///
/// Sentinel checks run strictly before structured decoding.
pub fn classify(text: &str) -> InboundFrame {
    if let Some(signal) = AuthSignal::from_sentinel(text) {
        return InboundFrame::Auth(signal);
    }

    match decode_frame(text) {
        Ok(message) => InboundFrame::Chat(message),
        Err(failure) => InboundFrame::Unparsed(failure),
    }
}

/// Whether a registration reply reports that no account was created.
pub fn is_registration_refusal(text: &str) -> bool {
    text.starts_with(REGISTRATION_FAILED_PREFIX) || text == INVALID_AUTH_TYPE
}
