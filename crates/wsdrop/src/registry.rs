// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping for live upload sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::session::SessionState;

/// Point-in-time view of a session's progress.
#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub state: SessionState,
    pub filename: Option<String>,
    pub bytes_received: u64,
    pub bytes_expected: Option<u64>,
}

/// Registry-visible handle to one connection's session.
pub struct SessionHandle {
    pub id: Uuid,
    pub started_at: Instant,
    pub cancel: CancellationToken,
    pub progress: RwLock<Progress>,
}

impl SessionHandle {
    pub fn new(id: Uuid, cancel: CancellationToken) -> Self {
        Self {
            id,
            started_at: Instant::now(),
            cancel,
            progress: RwLock::new(Progress {
                state: SessionState::AuthPending,
                filename: None,
                bytes_received: 0,
                bytes_expected: None,
            }),
        }
    }
}

/// Serializable summary returned by the sessions API.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub uptime_ms: u64,
    #[serde(flatten)]
    pub progress: Progress,
}

/// Live sessions keyed by id. Owned by the server state, never global.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, handle: Arc<SessionHandle>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(handle.id, handle);
    }

    /// Remove a session. Returns false when it was not registered.
    pub async fn unregister(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn list(&self) -> Vec<SessionInfo> {
        let handles: Vec<Arc<SessionHandle>> =
            self.sessions.read().await.values().cloned().collect();

        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            let progress = handle.progress.read().await.clone();
            out.push(SessionInfo {
                id: handle.id.to_string(),
                uptime_ms: handle.started_at.elapsed().as_millis() as u64,
                progress,
            });
        }
        out.sort_by(|a, b| b.uptime_ms.cmp(&a.uptime_ms));
        out
    }

    /// Ask every live session to stop. Sessions unwind through their own
    /// failure path and unregister themselves.
    pub async fn cancel_all(&self) {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            handle.cancel.cancel();
        }
        if !sessions.is_empty() {
            tracing::info!(count = sessions.len(), "cancelled active upload sessions");
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
