//! In-memory store
//!
//! Thread-safe maps behind `tokio::sync::RwLock`. Used by the test suites and
//! for local runs without PostgreSQL. Behaves like `PgStore`: unique emails,
//! refresh tokens kept as tombstones after revocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{RefreshToken, RefreshTokenStore, StoreError, StoreResult, User, UserStore};

/// In-memory implementation of every store capability
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    refresh_tokens: RwLock<HashMap<String, RefreshToken>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh tokens, revoked ones included
    pub async fn refresh_token_count(&self) -> usize {
        self.refresh_tokens.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user with email {email}")))
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::Conflict(format!("email {email} already registered")));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        // Lock order: users, then tokens
        let mut users = self.users.write().await;
        let mut tokens = self.refresh_tokens.write().await;

        let removed = users.len() as u64;
        users.clear();
        tokens.clear();
        Ok(removed)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(token) {
            return Err(StoreError::Conflict("refresh token already exists".to_string()));
        }

        let now = Utc::now();
        let record = RefreshToken {
            token: token.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };
        tokens.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshToken> {
        self.refresh_tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("refresh token".to_string()))
    }

    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()> {
        let mut tokens = self.refresh_tokens.write().await;
        let record = tokens
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound("refresh token".to_string()))?;

        let now = Utc::now();
        record.revoked_at = Some(now);
        record.updated_at = now;
        Ok(())
    }
}
