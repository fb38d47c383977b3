//! Application state management
//!
//! Author: bailey4770

use crate::auth::{AuthService, JwtConfig};
use chirpy_core::config::AppConfig;
use chirpy_core::{MemoryStore, RefreshTokenStore, UserStore};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Authentication flows over the configured stores
    pub auth: AuthService,
}

impl AppState {
    /// Create new application state over the given stores
    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        let auth = AuthService::new(users, refresh_tokens, JwtConfig::from(&config.auth))
            .with_webhook_key(config.auth.polka_key.clone());

        Self {
            config,
            auth,
        }
    }

    /// State backed by a fresh in-process store
    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store)
    }
}
