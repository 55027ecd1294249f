//! Per-connection credential.
//!
//! Presented once in the connection handshake and retained by the connection
//! handle until the offline report has been sent.

use std::fmt;

use crate::error::{RelayError, Result};

/// Header carrying the client's authorization value (also used for the
/// service secret on the broadcast endpoint).
pub const AUTHORIZATION_HEADER: &str = "authorization";
/// Header carrying the client's session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// (authorization value, session token) pair. Values are opaque.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential {
    authorization: String,
    session_token: String,
}

impl AuthCredential {
    pub fn new(authorization: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            session_token: session_token.into(),
        }
    }

    /// Build from optional handshake header values.
    /// Missing or blank values are an auth failure.
    pub fn from_headers(authorization: Option<&str>, session_token: Option<&str>) -> Result<Self> {
        let authorization = authorization
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(RelayError::AuthFailed)?;
        let session_token = session_token
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(RelayError::AuthFailed)?;
        Ok(Self::new(authorization, session_token))
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredential")
            .field("authorization", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// Exact-equality check for the static service secret.
///
/// Runs over the whole presented value regardless of where the first
/// mismatch is, so response timing does not leak the matching prefix length.
pub fn secret_matches(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
