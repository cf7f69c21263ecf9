// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::storage::LocalStorage;

/// Shared server state.
pub struct AppState {
    pub config: Config,
    pub authenticator: Arc<Authenticator>,
    pub storage: Arc<LocalStorage>,
    /// Live upload sessions.
    pub registry: ConnectionRegistry,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            authenticator: Arc::new(Authenticator::new(config.auth_token.clone())),
            storage: Arc::new(LocalStorage::new(config.upload_dir.clone())),
            registry: ConnectionRegistry::new(),
            config,
        }
    }
}
