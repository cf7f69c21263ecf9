// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the HTTP API.
//!
//! Uses `axum_test::TestServer` — no real TCP needed.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use wsdrop::registry::SessionHandle;
use wsdrop::session::SessionState;
use wsdrop::state::AppState;
use wsdrop::test_support::test_state;
use wsdrop::transport::build_router;

const TOKEN: &str = "http-secret";

fn test_server(state: Arc<AppState>) -> TestServer {
    TestServer::new(build_router(state)).expect("failed to create test server")
}

#[tokio::test]
async fn health_needs_no_auth() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let state = test_state(tmp.path().to_path_buf(), TOKEN);
    let server = test_server(Arc::clone(&state));

    let resp = server.get("/api/v1/health").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["active_sessions"], 0);
    Ok(())
}

#[tokio::test]
async fn sessions_requires_bearer() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let server = test_server(test_state(tmp.path().to_path_buf(), TOKEN));

    let resp = server.get("/api/v1/sessions").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = server
        .get("/api/v1/sessions")
        .add_header("authorization", "Bearer wrong")
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn sessions_lists_registry() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let state = test_state(tmp.path().to_path_buf(), TOKEN);

    let handle = Arc::new(SessionHandle::new(Uuid::new_v4(), CancellationToken::new()));
    {
        let mut progress = handle.progress.write().await;
        progress.state = SessionState::Uploading;
        progress.filename = Some("movie.mkv".to_owned());
        progress.bytes_expected = Some(1000);
        progress.bytes_received = 250;
    }
    state.registry.register(Arc::clone(&handle)).await;

    let server = test_server(Arc::clone(&state));
    let resp = server
        .get("/api/v1/sessions")
        .add_header("authorization", format!("Bearer {TOKEN}"))
        .await;
    resp.assert_status(StatusCode::OK);

    let body: Vec<serde_json::Value> = resp.json();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], handle.id.to_string());
    assert_eq!(body[0]["state"], "uploading");
    assert_eq!(body[0]["filename"], "movie.mkv");
    assert_eq!(body[0]["bytes_received"], 250);
    assert_eq!(body[0]["bytes_expected"], 1000);

    let health: serde_json::Value = server.get("/api/v1/health").await.json();
    assert_eq!(health["active_sessions"], 1);
    Ok(())
}
