//! Authentication request frames.
//!
//! The first frame on every connection is an [`AuthRequest`]. The server
//! reads the `type` field to decide whether to create an account or check
//! credentials for a chat session.

use serde::{Deserialize, Serialize};

use crate::errors::CodecError;

/// Kind of authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Create an account. Single-shot: the server replies once and the
    /// connection is closed.
    Register,
    /// Authenticate and start a chat session.
    Login,
}

/// Authentication request envelope.
///
/// Serializes as `{"type":..,"username":..,"password":..}` with fields in
/// that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthRequest {
    /// Register or login.
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// Account name.
    pub username: String,
    /// Account password, sent in clear over the transport.
    pub password: String,
}

/// Encode an authentication request frame.
///
/// Does not validate the credentials; callers check for empty fields before
/// a connection is ever opened.
pub fn encode_request(
    kind: RequestKind,
    username: &str,
    password: &str,
) -> Result<String, CodecError> {
    let request =
        AuthRequest { kind, username: username.to_string(), password: password.to_string() };
    serde_json::to_string(&request).map_err(|e| CodecError::Encode(e.to_string()))
}
