// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for health and session introspection.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned(), active_sessions: s.registry.len().await })
}

/// `GET /api/v1/sessions` — live upload sessions, oldest first.
pub async fn list_sessions(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(s.registry.list().await)
}
