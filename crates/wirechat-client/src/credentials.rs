//! Validated login credentials.

use std::fmt;

use wirechat_proto::{CodecError, RequestKind, encode_request};

use crate::error::SessionError;

/// Username and password, both guaranteed non-empty.
///
/// The password is redacted from `Debug` output so credentials can be logged
/// with `?` formatting.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// # Errors
    ///
    /// - `SessionError::Validation` if either field is empty
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let username = username.into();
        let password = password.into();

        if username.is_empty() || password.is_empty() {
            return Err(SessionError::Validation);
        }

        Ok(Self { username, password })
    }

    /// Account name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Encode an authentication request frame carrying these credentials.
    pub fn encode_request(&self, kind: RequestKind) -> Result<String, CodecError> {
        encode_request(kind, &self.username, &self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
