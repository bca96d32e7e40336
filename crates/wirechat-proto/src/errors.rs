//! Codec error types.

use thiserror::Error;

/// Errors produced while encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Frame exceeds [`crate::MAX_FRAME_SIZE`]
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Actual frame size in bytes
        size: usize,
        /// Maximum allowed size in bytes
        max: usize,
    },

    /// Frame is not a valid chat envelope
    #[error("invalid envelope: {0}")]
    Json(String),

    /// Envelope has an empty `from` field
    #[error("envelope has empty sender")]
    EmptySender,

    /// Serialization of an outbound frame failed
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Inbound frame that could not be decoded as a chat envelope.
///
/// Never fatal. The original text is kept so the caller can display it as an
/// informational status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("undecodable frame: {error}")]
pub struct ParseFailure {
    /// The frame exactly as received.
    pub raw: String,
    /// Why decoding failed.
    pub error: CodecError,
}

impl ParseFailure {
    /// Wrap a decoding error together with the offending text.
    pub fn new(raw: impl Into<String>, error: CodecError) -> Self {
        Self { raw: raw.into(), error }
    }
}
