// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection upload state machine.
//!
//! ```text
//! AuthPending -> WaitingForHeader -> Uploading -> Complete
//!      \               \                \
//!       +---------------+----------------+-----> Error
//! ```
//!
//! Every phase returns `Result<_, UploadError>`; [`UploadSession::run`]
//! decides the status frame and close code from the error kind and
//! discards any partial file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, Authenticator, CHALLENGE_PREFIX};
use crate::codec::{self, HeaderError, UploadHeader};
use crate::connection::{Connection, Frame};
use crate::error::{TransferError, UploadError, CLOSE_NORMAL};
use crate::registry::SessionHandle;
use crate::storage::{sanitize_filename, stored_name, PendingUpload, Storage};

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AuthPending,
    WaitingForHeader,
    Uploading,
    Complete,
    Error,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthPending => "auth_pending",
            Self::WaitingForHeader => "waiting_for_header",
            Self::Uploading => "uploading",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// A finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// Filename as sent by the client.
    pub filename: String,
    /// Where the bytes were stored.
    pub path: PathBuf,
    pub bytes: u64,
}

pub struct UploadSession<S: Storage> {
    handle: Arc<SessionHandle>,
    authenticator: Arc<Authenticator>,
    storage: Arc<S>,
    idle_timeout: Option<Duration>,
    state: SessionState,
    authenticated: bool,
    header: Option<UploadHeader>,
    remaining: u64,
    received: u64,
    sink: Option<PendingUpload<S>>,
}

impl<S: Storage> UploadSession<S> {
    pub fn new(
        handle: Arc<SessionHandle>,
        authenticator: Arc<Authenticator>,
        storage: Arc<S>,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            handle,
            authenticator,
            storage,
            idle_timeout,
            state: SessionState::AuthPending,
            authenticated: false,
            header: None,
            remaining: 0,
            received: 0,
            sink: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn header(&self) -> Option<&UploadHeader> {
        self.header.as_ref()
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.remaining
    }

    /// Drive the connection to a terminal state, then close it.
    pub async fn run<C: Connection>(&mut self, conn: &mut C) -> Result<Completed, UploadError> {
        let result = self.drive(conn).await;

        match &result {
            Ok(done) => {
                self.set_state(SessionState::Complete).await;
                info!(
                    session = %self.handle.id,
                    filename = %done.filename,
                    path = %done.path.display(),
                    bytes = done.bytes,
                    "upload complete"
                );
                let status = format!(
                    "upload_ok:File '{}' received successfully ({} bytes)",
                    done.filename, done.bytes
                );
                if let Err(e) = conn.send_text(status).await {
                    debug!(session = %self.handle.id, err = %e, "completion status not delivered");
                }
                conn.close(CLOSE_NORMAL, "upload complete").await;
            }
            Err(err) => {
                self.discard_sink().await;
                self.set_state(SessionState::Error).await;
                warn!(session = %self.handle.id, kind = err.as_str(), err = %err, "upload failed");
                if err.peer_reachable() {
                    if let Err(e) = conn.send_text(err.status_message()).await {
                        debug!(session = %self.handle.id, err = %e, "failure status not delivered");
                    }
                }
                conn.close(err.close_code(), err.as_str()).await;
            }
        }

        result
    }

    async fn drive<C: Connection>(&mut self, conn: &mut C) -> Result<Completed, UploadError> {
        self.authenticate(conn).await?;
        let inline = self.receive_header(conn).await?;
        self.receive_chunks(conn, inline).await
    }

    async fn authenticate<C: Connection>(&mut self, conn: &mut C) -> Result<(), UploadError> {
        let challenge = self.authenticator.challenge();
        debug!(session = %self.handle.id, %challenge, "issued challenge");
        send(conn, format!("{CHALLENGE_PREFIX}{challenge}")).await?;

        match self.next_frame(conn).await? {
            Frame::Text(response) => self.authenticator.validate(&response)?,
            Frame::Binary(_) => return Err(AuthError::UnexpectedFrame.into()),
        }

        self.authenticated = true;
        self.set_state(SessionState::WaitingForHeader).await;
        send(conn, "auth_ok").await?;
        Ok(())
    }

    /// Accept the header frame and open the sink. Returns payload bytes that
    /// trailed the header in the same frame.
    async fn receive_header<C: Connection>(&mut self, conn: &mut C) -> Result<Bytes, UploadError> {
        let data = match self.next_frame(conn).await? {
            Frame::Binary(data) => data,
            Frame::Text(_) => return Err(HeaderError::UnexpectedFrame.into()),
        };

        let header = codec::parse_header(&data)?;
        let basename = sanitize_filename(&header.filename).ok_or(HeaderError::InvalidFilename)?;
        let name = stored_name(&self.handle.id, &basename);

        self.sink = Some(PendingUpload::open(Arc::clone(&self.storage), name).await?);
        self.remaining = header.content_length;
        {
            let mut progress = self.handle.progress.write().await;
            progress.filename = Some(header.filename.clone());
            progress.bytes_expected = Some(header.content_length);
        }
        self.set_state(SessionState::Uploading).await;
        info!(
            session = %self.handle.id,
            filename = %header.filename,
            bytes = header.content_length,
            "header accepted"
        );

        let inline = data.slice(header.encoded_len()..);
        self.header = Some(header);
        send(conn, "header_ok").await?;
        Ok(inline)
    }

    async fn receive_chunks<C: Connection>(
        &mut self,
        conn: &mut C,
        inline: Bytes,
    ) -> Result<Completed, UploadError> {
        if !inline.is_empty() {
            self.write_chunk(&inline).await?;
        }

        // Frames sent after the declared length are never read; the
        // connection closes right after `upload_ok`.
        while self.remaining > 0 {
            let chunk = match self.next_frame(conn).await? {
                Frame::Binary(chunk) => chunk,
                Frame::Text(_) => return Err(TransferError::UnexpectedFrame.into()),
            };
            if chunk.is_empty() {
                return Err(TransferError::EarlyEnd {
                    received: self.received,
                    expected: self.received + self.remaining,
                }
                .into());
            }
            self.write_chunk(&chunk).await?;
        }

        let sink = self.sink.take().ok_or_else(sink_missing)?;
        let path = sink.commit().await?;
        let filename = self.header.as_ref().map(|h| h.filename.clone()).unwrap_or_default();
        Ok(Completed { filename, path, bytes: self.received })
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let len = chunk.len() as u64;
        if len > self.remaining {
            return Err(TransferError::Overflow { chunk: len, remaining: self.remaining }.into());
        }

        self.sink.as_mut().ok_or_else(sink_missing)?.write(chunk).await?;
        self.remaining -= len;
        self.received += len;
        self.handle.progress.write().await.bytes_received = self.received;
        Ok(())
    }

    /// Wait for the next frame, honoring the idle timeout and cancellation.
    async fn next_frame<C: Connection>(&self, conn: &mut C) -> Result<Frame, TransferError> {
        tokio::select! {
            biased;
            _ = self.handle.cancel.cancelled() => Err(TransferError::Shutdown),
            frame = recv_frame(conn, self.idle_timeout) => frame,
        }
    }

    async fn discard_sink(&mut self) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        let name = sink.name().to_owned();
        match sink.discard().await {
            Ok(()) => debug!(session = %self.handle.id, %name, "partial upload removed"),
            Err(e) => warn!(session = %self.handle.id, %name, err = %e, "failed to remove partial upload"),
        }
    }

    async fn set_state(&mut self, next: SessionState) {
        debug!(
            session = %self.handle.id,
            prev = self.state.as_str(),
            next = next.as_str(),
            "session transition"
        );
        self.state = next;
        self.handle.progress.write().await.state = next;
    }
}

async fn recv_frame<C: Connection>(
    conn: &mut C,
    idle_timeout: Option<Duration>,
) -> Result<Frame, TransferError> {
    let frame = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, conn.recv())
            .await
            .map_err(|_| TransferError::IdleTimeout)?,
        None => conn.recv().await,
    };
    match frame {
        Ok(Some(frame)) => Ok(frame),
        Ok(None) => Err(TransferError::Disconnected),
        Err(e) => Err(TransferError::Unreadable(e.0)),
    }
}

async fn send<C: Connection>(conn: &mut C, text: impl Into<String>) -> Result<(), TransferError> {
    conn.send_text(text.into()).await.map_err(|_| TransferError::Disconnected)
}

fn sink_missing() -> UploadError {
    UploadError::Storage(std::io::Error::other("upload sink is not open"))
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
