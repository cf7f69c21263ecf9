// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: builders, a scripted connection, and server
//! helpers.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;

use crate::codec::UploadHeader;
use crate::config::Config;
use crate::connection::{Connection, Frame, TransportError};
use crate::state::AppState;

/// Connection that replays a fixed list of inbound frames.
///
/// Once the script is drained it reports a disconnect (default), a read
/// failure, or blocks forever for idle-timeout and cancellation tests.
#[derive(Debug, Default)]
pub struct ScriptedConnection {
    inbound: VecDeque<Frame>,
    hang_when_drained: bool,
    read_error: Option<String>,
    disconnected: bool,
    /// Text frames the session sent, in order.
    pub sent: Vec<String>,
    /// Code of the first close call.
    pub close_code: Option<u16>,
    pub close_calls: usize,
}

impl ScriptedConnection {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self { inbound: frames.into_iter().collect(), ..Default::default() }
    }

    /// Block instead of disconnecting once the script runs out.
    pub fn hang_when_drained(mut self) -> Self {
        self.hang_when_drained = true;
        self
    }

    /// Fail the next read with `reason` once the script runs out.
    pub fn fail_read_when_drained(mut self, reason: &str) -> Self {
        self.read_error = Some(reason.to_owned());
        self
    }

    /// Status frames after the challenge.
    pub fn statuses(&self) -> Vec<&str> {
        self.sent.iter().skip(1).map(String::as_str).collect()
    }
}

impl Connection for ScriptedConnection {
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        if let Some(frame) = self.inbound.pop_front() {
            return Ok(Some(frame));
        }
        if let Some(reason) = self.read_error.take() {
            return Err(TransportError(reason));
        }
        if self.hang_when_drained {
            std::future::pending::<()>().await;
        }
        self.disconnected = true;
        Ok(None)
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.disconnected || self.close_code.is_some() {
            return Err(TransportError("connection closed".to_owned()));
        }
        self.sent.push(text);
        Ok(())
    }

    async fn close(&mut self, code: u16, _reason: &str) {
        self.close_calls += 1;
        if self.close_code.is_none() {
            self.close_code = Some(code);
        }
    }
}

pub fn text(s: &str) -> Frame {
    Frame::Text(s.to_owned())
}

pub fn binary(data: &[u8]) -> Frame {
    Frame::Binary(Bytes::copy_from_slice(data))
}

/// Encoded header frame for `filename` declaring `content_length` bytes.
pub fn header_frame(filename: &str, content_length: u64) -> Frame {
    Frame::Binary(UploadHeader { filename: filename.to_owned(), content_length }.encode())
}

/// Config with test defaults rooted at `upload_dir`.
pub fn test_config(upload_dir: PathBuf, auth_token: &str) -> Config {
    Config {
        host: "127.0.0.1".to_owned(),
        port: 0,
        upload_dir,
        auth_token: auth_token.to_owned(),
        max_message_bytes: 1024 * 1024,
        idle_timeout_ms: 5000,
        log_level: "info".to_owned(),
        log_format: "text".to_owned(),
    }
}

pub fn test_state(upload_dir: PathBuf, auth_token: &str) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(upload_dir, auth_token)))
}

/// Spawn the HTTP/WS server on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<AppState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}

/// Assert that a `Result` is `Err` and its message contains `substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
