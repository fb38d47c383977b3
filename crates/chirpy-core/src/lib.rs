//! Chirpy Core - domain records and storage contracts
//!
//! This crate defines the data shared between the storage layer and the API:
//! - `User` and `RefreshToken` records as persisted by the relational store
//! - Capability traits (`UserStore`, `RefreshTokenStore`) injected into the API
//! - `PgStore` (PostgreSQL) and `MemoryStore` implementations
//! - Application configuration
//!
//! Author: bailey4770

pub mod config;
pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Storage errors surfaced by every store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// True when the requested row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Records
// ============================================================================

/// User account as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    /// Argon2id PHC string, never sent to clients
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// Chirpy Red membership flag
    pub is_chirpy_red: bool,
}

/// Long-lived refresh token as stored in the `refresh_tokens` table
///
/// Rows are never deleted. A revoked token stays behind as a tombstone with
/// `revoked_at` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    /// 64 lowercase hex characters
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Whether the token has been revoked, regardless of when
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ============================================================================
// Traits
// ============================================================================

/// User persistence used by the register, login and update-credentials flows
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with `Conflict` if the email is taken
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User>;

    /// Fetch a user by exact email
    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Replace email and password hash of an existing user
    async fn update_user(&self, id: Uuid, email: &str, hashed_password: &str)
        -> StoreResult<User>;

    /// Set the Chirpy Red flag on a user
    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()>;

    /// Remove every user and, through the cascade, their refresh tokens.
    /// Returns the number of users removed.
    async fn delete_all_users(&self) -> StoreResult<u64>;
}

/// Refresh token persistence used by the login, refresh and revoke flows
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store a freshly issued token with no revocation
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken>;

    /// Return the current row for `token`, revoked or not
    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshToken>;

    /// Set `revoked_at` to now; re-revoking overwrites the timestamp
    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()>;
}

// ============================================================================
// Tests
// ============================================================================
