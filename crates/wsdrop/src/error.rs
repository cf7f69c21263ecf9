// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::io;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::codec::HeaderError;

/// WebSocket close code for a normal shutdown.
pub const CLOSE_NORMAL: u16 = 1000;
/// WebSocket close code for malformed or unsupported data.
pub const CLOSE_UNSUPPORTED_DATA: u16 = 1003;
/// Application close code for authentication failure.
pub const CLOSE_AUTH_FAILED: u16 = 4001;

/// Byte-count and framing failures after the header was accepted, plus
/// connection loss in any phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Client sent an empty chunk before the declared length was reached.
    EarlyEnd { received: u64, expected: u64 },
    /// A chunk would push the total past the declared length.
    Overflow { chunk: u64, remaining: u64 },
    /// A text frame arrived mid-upload.
    UnexpectedFrame,
    /// An inbound message could not be read.
    Unreadable(String),
    /// The peer went away.
    Disconnected,
    /// No frame arrived within the idle timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EarlyEnd { received, expected } => {
                write!(f, "stream ended after {received} of {expected} bytes")
            }
            Self::Overflow { chunk, remaining } => {
                write!(f, "chunk of {chunk} bytes exceeds remaining {remaining} bytes")
            }
            Self::UnexpectedFrame => f.write_str("expected a binary chunk"),
            Self::Unreadable(reason) => write!(f, "unreadable message: {reason}"),
            Self::Disconnected => f.write_str("connection closed"),
            Self::IdleTimeout => f.write_str("idle timeout"),
            Self::Shutdown => f.write_str("server shutting down"),
        }
    }
}

/// Terminal failure of an upload session.
#[derive(Debug)]
pub enum UploadError {
    Auth(AuthError),
    Header(HeaderError),
    Transfer(TransferError),
    Storage(io::Error),
}

impl UploadError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AUTH_ERROR",
            Self::Header(_) => "HEADER_ERROR",
            Self::Transfer(_) => "TRANSFER_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Close code sent to the peer when the session ends with this error.
    pub fn close_code(&self) -> u16 {
        match self {
            Self::Auth(_) => CLOSE_AUTH_FAILED,
            Self::Header(_) | Self::Transfer(TransferError::Unreadable(_)) => {
                CLOSE_UNSUPPORTED_DATA
            }
            Self::Transfer(_) | Self::Storage(_) => CLOSE_NORMAL,
        }
    }

    /// Status frame reported to the peer before closing.
    pub fn status_message(&self) -> String {
        match self {
            Self::Auth(e) => format!("auth_error:{}", e.as_str()),
            Self::Header(e) => format!("header_error:{e}"),
            Self::Transfer(e) => format!("upload_error:{e}"),
            // Server-side paths stay in the log.
            Self::Storage(_) => "upload_error:storage failure".to_owned(),
        }
    }

    /// Whether the peer can still be written to.
    pub fn peer_reachable(&self) -> bool {
        !matches!(self, Self::Transfer(TransferError::Disconnected))
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth(e) => write!(f, "authentication failed: {e}"),
            Self::Header(e) => write!(f, "bad header: {e}"),
            Self::Transfer(e) => write!(f, "transfer failed: {e}"),
            Self::Storage(e) => write!(f, "storage failed: {e}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Auth(e) => Some(e),
            Self::Header(e) => Some(e),
            Self::Transfer(_) => None,
            Self::Storage(e) => Some(e),
        }
    }
}

impl From<AuthError> for UploadError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<HeaderError> for UploadError {
    fn from(e: HeaderError) -> Self {
        Self::Header(e)
    }
}

impl From<TransferError> for UploadError {
    fn from(e: TransferError) -> Self {
        Self::Transfer(e)
    }
}

impl From<io::Error> for UploadError {
    fn from(e: io::Error) -> Self {
        Self::Storage(e)
    }
}

/// Failures of the bearer-protected HTTP endpoints (`/api/v1/sessions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    Unauthorized,
}

impl ApiError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
