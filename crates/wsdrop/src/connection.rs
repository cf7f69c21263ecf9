// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-oriented connection seen by an upload session.

use std::fmt;
use std::future::Future;

use bytes::Bytes;

/// One discrete inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// A read or write on the underlying transport failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Ordered, boundary-preserving, bidirectional message channel.
pub trait Connection: Send {
    /// Next data frame, or `None` once the peer disconnected.
    ///
    /// An `Err` means one inbound message was unreadable (oversized,
    /// malformed). The connection stays open for a status reply and close.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Frame>, TransportError>> + Send;

    fn send_text(&mut self, text: String)
        -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close with `code`. Closing an already closed connection is a no-op.
    fn close(&mut self, code: u16, reason: &str) -> impl Future<Output = ()> + Send;
}
