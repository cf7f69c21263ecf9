// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Challenge/response authentication for upload sessions.
//!
//! The challenge is a fresh UUID per connection. It is informational only:
//! the response is a static bearer credential and is not bound to the
//! challenge, so a captured response can be replayed on a new connection.

use std::fmt;

use axum::http::HeaderMap;

/// Prefix of every challenge frame.
pub const CHALLENGE_PREFIX: &str = "challenge:";

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Why an authentication response was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Response is not of the form `Bearer <token>`.
    Malformed,
    /// Well-formed response carrying the wrong token.
    InvalidToken,
    /// A binary frame arrived where the text response was expected.
    UnexpectedFrame,
}

impl AuthError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed_credential",
            Self::InvalidToken => "invalid_token",
            Self::UnexpectedFrame => "expected_text_credential",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for AuthError {}

/// Validates bearer credentials against the single configured secret.
#[derive(Clone)]
pub struct Authenticator {
    token: String,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").field("token", &"<redacted>").finish()
    }
}

impl Authenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    /// Produce a fresh challenge value.
    pub fn challenge(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Check a `Bearer <token>` response.
    ///
    /// Exactly two space-separated segments are accepted; anything else is
    /// [`AuthError::Malformed`].
    pub fn validate(&self, response: &str) -> Result<(), AuthError> {
        let mut parts = response.split(' ');
        let (Some("Bearer"), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AuthError::Malformed);
        };
        if token.is_empty() {
            return Err(AuthError::Malformed);
        }
        if constant_time_eq(token, &self.token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Validate the `Authorization` header of an HTTP request.
    pub fn validate_headers(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Malformed)?;
        self.validate(header)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
