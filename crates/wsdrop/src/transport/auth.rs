// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

/// Axum middleware that enforces Bearer token authentication.
///
/// Exempt: `/api/v1/health` and the `/ws` upgrade, which runs its own
/// challenge/response handshake.
pub async fn auth_layer(
    State(state): State<Arc<AppState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/api/v1/health" || path == "/ws" {
        return next.run(req).await;
    }

    if let Err(e) = state.authenticator.validate_headers(req.headers()) {
        tracing::debug!(path, err = %e, "rejected unauthenticated request");
        return ApiError::Unauthorized.to_http_response("unauthorized").into_response();
    }

    next.run(req).await
}
