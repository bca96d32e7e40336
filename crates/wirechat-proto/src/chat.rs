//! Chat message envelopes.
//!
//! # Invariants
//!
//! - Decoding is strict: every field is required, unknown fields are
//!   rejected, `timestamp` must be an integer and `from` must be non-empty.
//! - Frames longer than [`MAX_FRAME_SIZE`] are rejected before any parsing.
//!
//! # Security
//!
//! Envelopes carry no signature. `from` is whatever the server relayed, so a
//! decoded message is structurally valid but not authenticated.

use serde::{Deserialize, Serialize};

use crate::{
    MAX_FRAME_SIZE,
    errors::{CodecError, ParseFailure},
};

/// Chat message envelope.
///
/// Serializes as `{"from":..,"content":..,"timestamp":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatMessage {
    /// Display name of the author.
    pub from: String,
    /// Message text.
    pub content: String,
    /// Creation time in Unix milliseconds, taken from the author's clock.
    pub timestamp: i64,
}

impl ChatMessage {
    /// Create a new chat message.
    pub fn new(from: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        Self { from: from.into(), content: content.into(), timestamp }
    }
}

/// Encode a chat envelope.
pub fn encode_chat(message: &ChatMessage) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decode a chat envelope.
///
/// Never panics. Malformed input yields a [`ParseFailure`] carrying the
/// original text.
pub fn decode_frame(text: &str) -> Result<ChatMessage, ParseFailure> {
    try_decode(text).map_err(|error| ParseFailure::new(text, error))
}

fn try_decode(text: &str) -> Result<ChatMessage, CodecError> {
    if text.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge { size: text.len(), max: MAX_FRAME_SIZE });
    }

    let message: ChatMessage =
        serde_json::from_str(text).map_err(|e| CodecError::Json(e.to_string()))?;

    if message.from.is_empty() {
        return Err(CodecError::EmptySender);
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_frame_shape() {
        let frame = encode_chat(&ChatMessage::new("alice", "hello", 1_700_000_000_000)).unwrap();
        insta::assert_snapshot!(frame, @r#"{"from":"alice","content":"hello","timestamp":1700000000000}"#);
    }

    #[test]
    fn decode_valid_envelope() {
        let message = decode_frame(r#"{"from":"bob","content":"hi","timestamp":1234}"#).unwrap();
        assert_eq!(message, ChatMessage::new("bob", "hi", 1234));
    }

    #[test]
    fn decode_ignores_field_order() {
        let message = decode_frame(r#"{"timestamp":5,"content":"x","from":"carol"}"#).unwrap();
        assert_eq!(message, ChatMessage::new("carol", "x", 5));
    }

    #[test]
    fn reject_missing_field() {
        let failure = decode_frame(r#"{"from":"bob","content":"hi"}"#).unwrap_err();
        assert!(matches!(failure.error, CodecError::Json(_)));
        assert_eq!(failure.raw, r#"{"from":"bob","content":"hi"}"#);
    }

    #[test]
    fn reject_unknown_field() {
        let result = decode_frame(r#"{"from":"bob","content":"hi","timestamp":1,"admin":true}"#);
        assert!(matches!(result, Err(ParseFailure { error: CodecError::Json(_), .. })));
    }

    #[test]
    fn reject_non_integer_timestamp() {
        assert!(decode_frame(r#"{"from":"bob","content":"hi","timestamp":1.5}"#).is_err());
        assert!(decode_frame(r#"{"from":"bob","content":"hi","timestamp":"1"}"#).is_err());
    }

    #[test]
    fn reject_empty_sender() {
        let failure = decode_frame(r#"{"from":"","content":"hi","timestamp":1}"#).unwrap_err();
        assert_eq!(failure.error, CodecError::EmptySender);
    }

    #[test]
    fn reject_oversized_frame() {
        let content = "x".repeat(MAX_FRAME_SIZE);
        let text = format!(r#"{{"from":"bob","content":"{content}","timestamp":1}}"#);

        let failure = decode_frame(&text).unwrap_err();
        assert!(matches!(failure.error, CodecError::FrameTooLarge { .. }));
    }

    #[test]
    fn reject_plain_text() {
        let failure = decode_frame("Registration successful").unwrap_err();
        assert_eq!(failure.raw, "Registration successful");
    }
}
