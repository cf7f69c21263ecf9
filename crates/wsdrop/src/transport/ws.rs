// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket transport for the upload protocol.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::connection::{Connection, Frame, TransportError};
use crate::registry::SessionHandle;
use crate::session::UploadSession;
use crate::state::AppState;

/// [`Connection`] over an axum WebSocket.
///
/// Control frames are handled by the socket and never surface as frames.
pub struct WsConnection {
    socket: WebSocket,
    closed: bool,
}

impl WsConnection {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket, closed: false }
    }
}

impl Connection for WsConnection {
    async fn recv(&mut self) -> Result<Option<Frame>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.socket.recv().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Text(text.as_str().to_owned())))
                }
                Some(Ok(Message::Binary(data))) => return Ok(Some(Frame::Binary(data))),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                // Read side failed (size limit, bad UTF-8); writes may still work.
                Some(Err(e)) => return Err(TransportError(e.to_string())),
                Some(Ok(Message::Close(_))) | None => {
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError("connection closed".to_owned()));
        }
        self.socket.send(Message::Text(text.into())).await.map_err(|e| {
            self.closed = true;
            TransportError(e.to_string())
        })
    }

    async fn close(&mut self, code: u16, reason: &str) {
        if self.closed {
            return;
        }
        self.closed = true;
        let frame = CloseFrame { code, reason: reason.into() };
        if let Err(e) = self.socket.send(Message::Close(Some(frame))).await {
            debug!(err = %e, "close frame not delivered");
        }
    }
}

/// `GET /ws` — upgrade to the upload protocol.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let limit = state.config.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_connection(state, socket))
}

/// Per-connection upload session.
async fn handle_connection(state: Arc<AppState>, socket: WebSocket) {
    let id = Uuid::new_v4();
    let handle = Arc::new(SessionHandle::new(id, CancellationToken::new()));
    state.registry.register(Arc::clone(&handle)).await;
    info!(session = %id, "upload connection opened");

    let mut conn = WsConnection::new(socket);
    let mut session = UploadSession::new(
        handle,
        Arc::clone(&state.authenticator),
        Arc::clone(&state.storage),
        state.config.idle_timeout(),
    );
    // Outcome is logged by the session.
    let _ = session.run(&mut conn).await;

    state.registry.unregister(&id).await;
    debug!(session = %id, state = session.state().as_str(), "upload connection closed");
}
