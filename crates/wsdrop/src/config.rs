// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::codec::MIN_HEADER_LEN;

/// Authenticated chunked file upload server.
#[derive(Debug, Clone, Parser)]
#[command(name = "wsdrop", version, about)]
pub struct Config {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "WSDROP_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "WSDROP_PORT")]
    pub port: u16,

    /// Directory uploads are stored in. Created on startup.
    #[arg(long, default_value = "uploads", env = "WSDROP_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// Bearer token clients must present.
    #[arg(long, env = "WSDROP_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Largest accepted WebSocket message (header or chunk) in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024, env = "WSDROP_MAX_MESSAGE_BYTES")]
    pub max_message_bytes: usize,

    /// Per-state receive timeout in milliseconds (0 disables).
    #[arg(long, default_value_t = 30_000, env = "WSDROP_IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: u64,

    /// Log filter directive (e.g. `info`, `wsdrop=debug`).
    #[arg(long, default_value = "info", env = "WSDROP_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format (`text` or `json`).
    #[arg(long, default_value = "text", env = "WSDROP_LOG_FORMAT")]
    pub log_format: String,
}

impl Config {
    /// Validate option combinations that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth_token.trim().is_empty() {
            anyhow::bail!("--auth-token must not be empty");
        }
        if self.auth_token.contains(char::is_whitespace) {
            anyhow::bail!("--auth-token must not contain whitespace");
        }
        if self.max_message_bytes < MIN_HEADER_LEN {
            anyhow::bail!("--max-message-bytes must be at least {MIN_HEADER_LEN}");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other} (expected text or json)"),
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_ms > 0).then(|| Duration::from_millis(self.idle_timeout_ms))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
