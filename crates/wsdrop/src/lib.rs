// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wsdrop: authenticated chunked file uploads over WebSocket.

pub mod auth;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod session;
pub mod state;
pub mod storage;
pub mod test_support;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::state::AppState;
use crate::transport::build_router;

/// How long shutdown waits for cancelled sessions to clean up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the upload server until Ctrl-C or `shutdown` is cancelled.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let state = Arc::new(AppState::new(config));

    let router = build_router(Arc::clone(&state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        upload_dir = %state.config.upload_dir.display(),
        "wsdrop listening on {addr}"
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, shutting down");
                shutdown.cancel();
            }
        });
    }

    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    // Upgraded connections outlive the listener; stop them and let them
    // remove their partial files.
    state.registry.cancel_all().await;
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while !state.registry.is_empty().await {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::warn!(remaining = state.registry.len().await, "sessions still active at exit");
    }

    Ok(())
}
