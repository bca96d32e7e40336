//! Wire codec for Wirechat.
//!
//! Translates between the transport's raw text frames and structured data.
//! Outbound, the client emits JSON authentication requests and chat envelopes.
//! Inbound, the server emits either a plain-text authentication sentinel, a
//! free-form registration reply, or a JSON chat envelope.
//!
//! Everything here is pure and stateless. Decoding never panics and never
//! returns an error the caller has to propagate: an undecodable frame becomes
//! a [`ParseFailure`] that still carries the original text for display.
//!
//! # Classification order
//!
//! Sentinels are plain text and would fail JSON decoding, so
//! [`classify`] compares against [`AUTH_SUCCESS`] and [`AUTH_FAILURE`]
//! strictly before attempting [`decode_frame`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
pub mod errors;
mod inbound;
mod request;

pub use chat::{ChatMessage, decode_frame, encode_chat};
pub use errors::{CodecError, ParseFailure};
pub use inbound::{
    AUTH_FAILURE, AUTH_SUCCESS, AuthSignal, INVALID_AUTH_TYPE, InboundFrame, MAX_FRAME_SIZE,
    REGISTRATION_FAILED_PREFIX, REGISTRATION_SUCCESS, classify, is_registration_refusal,
};
pub use request::{AuthRequest, RequestKind, encode_request};
