//! PostgreSQL store
//!
//! Implements the user and refresh-token capabilities on top of SQLx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::{RefreshToken, RefreshTokenStore, StoreError, StoreResult, User, UserStore};

/// Schema applied at start-up
pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    is_chirpy_red BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    token TEXT PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user ON refresh_tokens(user_id);
"#;

const USER_COLUMNS: &str = "id, created_at, updated_at, email, hashed_password, is_chirpy_red";
const TOKEN_COLUMNS: &str = "token, user_id, created_at, updated_at, expires_at, revoked_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to PostgreSQL with a bounded pool
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(CREATE_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to apply schema: {e}")))?;

        tracing::debug!("Database schema is up to date");
        Ok(())
    }
}

fn database_error(context: &str, err: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{context}: {err}"))
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, email: &str, hashed_password: &str) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (id, email, hashed_password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("email {email} already registered"))
                }
                _ => database_error("Failed to create user", e),
            })
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to fetch user", e))?
            .ok_or_else(|| StoreError::NotFound(format!("user with email {email}")))
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> StoreResult<User> {
        let query = format!(
            "UPDATE users SET email = $2, hashed_password = $3, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(email)
            .bind(hashed_password)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    StoreError::Conflict(format!("email {email} already registered"))
                }
                _ => database_error("Failed to update user", e),
            })?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    async fn upgrade_user(&self, id: Uuid) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("Failed to upgrade user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn delete_all_users(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("Failed to delete users", e))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let query = format!(
            "INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3) RETURNING {TOKEN_COLUMNS}"
        );

        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("Failed to store refresh token", e))
    }

    async fn get_refresh_token(&self, token: &str) -> StoreResult<RefreshToken> {
        let query = format!("SELECT {TOKEN_COLUMNS} FROM refresh_tokens WHERE token = $1");

        sqlx::query_as::<_, RefreshToken>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("Failed to fetch refresh token", e))?
            .ok_or_else(|| StoreError::NotFound("refresh token".to_string()))
    }

    async fn revoke_refresh_token(&self, token: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW(), updated_at = NOW() WHERE token = $1",
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to revoke refresh token", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("refresh token".to_string()));
        }
        Ok(())
    }
}
