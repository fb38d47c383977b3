//! Authentication service layer
//!
//! Composes the credential hasher, the session token issuer and the refresh
//! token lifecycle into the register, login, update-credentials, refresh and
//! revoke flows. Holds no state of its own; users and refresh tokens live
//! behind the injected store capabilities.

use super::jwt::{issue_access_token, validate_access_token, JwtConfig};
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use super::refresh::{generate_refresh_token, is_well_formed, refresh_token_ttl};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use chirpy_core::{RefreshToken, RefreshTokenStore, StoreError, User, UserStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

/// Default and maximum lifetime of a session token
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Apply the session policy to a caller-supplied lifetime
///
/// Unset, zero, or anything above one hour becomes one hour.
pub fn clamp_session_ttl(requested: Option<Duration>) -> Duration {
    match requested {
        Some(ttl) if !ttl.is_zero() && ttl < MAX_SESSION_TTL => ttl,
        _ => MAX_SESSION_TTL,
    }
}

/// Email and password, used by registration and credential updates
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested session lifetime; clamped to one hour
    #[serde(default)]
    pub expires_in_seconds: Option<u64>,
}

/// Public user profile, never carries password or token material
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// Login response: public profile plus both tokens
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
    /// Session token (JWT, HS256)
    pub token: String,
    /// Refresh token (64 hex characters)
    pub refresh_token: String,
}

/// Fresh session token minted from a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

fn validate_credentials(request: &CredentialsRequest) -> Result<(), String> {
    if request.email.trim().is_empty() {
        return Err("Email is required".to_string());
    }
    if !request.email.contains('@') {
        return Err("Invalid email format".to_string());
    }
    if request.password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(())
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
    webhook_key: Option<String>,
}

impl AuthService {
    /// Create a new authentication service over the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt_config: JwtConfig,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt_config,
            password_config: PasswordConfig::default(),
            webhook_key: None,
        }
    }

    /// Override the Argon2 cost parameters
    pub fn with_password_config(mut self, config: PasswordConfig) -> Self {
        self.password_config = config;
        self
    }

    /// Accept webhook calls authenticated with this API key
    pub fn with_webhook_key(mut self, key: Option<String>) -> Self {
        self.webhook_key = key;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    /// Hash on the blocking pool
    async fn hash(&self, password: String) -> Result<String, AppError> {
        let config = self.password_config.clone();
        tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
            .map_err(AppError::from)
    }

    /// Register a new user
    ///
    /// # Returns
    ///
    /// * `Ok(UserResponse)` - Newly created user, no token material
    /// * `Err(AppError)` - Invalid input (400), email taken (409) or store failure
    pub async fn register(
        &self,
        ctx: &AuditContext,
        request: CredentialsRequest,
    ) -> Result<UserResponse, AppError> {
        if let Err(reason) = validate_credentials(&request) {
            audit_log(
                ctx,
                &AuditEvent::RegistrationFailure {
                    email: request.email.clone(),
                    reason: reason.clone(),
                },
            );
            return Err(AppError::BadRequest(reason));
        }

        let CredentialsRequest { email, password } = request;
        let hashed_password = self.hash(password).await?;

        let user = self
            .users
            .create_user(&email, &hashed_password)
            .await
            .map_err(|e| {
                audit_log(
                    ctx,
                    &AuditEvent::RegistrationFailure {
                        email: email.clone(),
                        reason: e.to_string(),
                    },
                );
                match e {
                    StoreError::Conflict(_) => {
                        AppError::Conflict("Email already registered".to_string())
                    }
                    other => other.into(),
                }
            })?;

        audit_log(
            ctx,
            &AuditEvent::RegistrationSuccess {
                user_id: user.id,
                email: user.email.clone(),
            },
        );
        tracing::info!(user_id = %user.id, "New user created");

        Ok(user.into())
    }

    /// Login with email and password
    ///
    /// An unknown email, a failed lookup, a wrong password and an unreadable
    /// stored hash all produce the same `Unauthorized` error. Only the audit
    /// log records which one it was.
    pub async fn login(
        &self,
        ctx: &AuditContext,
        request: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let LoginRequest {
            email,
            password,
            expires_in_seconds,
        } = request;

        let fail = |reason: &str| {
            audit_log(
                ctx,
                &AuditEvent::LoginFailure {
                    email: email.clone(),
                    reason: reason.to_string(),
                },
            );
            AppError::invalid_credentials()
        };

        let user = match self.users.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => return Err(fail("unknown email")),
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during login");
                return Err(fail("user lookup failed"));
            }
        };

        let stored_hash = user.hashed_password.clone();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))?;

        match matched {
            Ok(true) => {}
            Ok(false) => return Err(fail("password mismatch")),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                return Err(fail("unreadable password hash"));
            }
        }

        let ttl = clamp_session_ttl(expires_in_seconds.map(Duration::from_secs));
        let token = issue_access_token(&self.jwt_config, user.id, ttl)?;
        let refresh_token = self.issue_refresh_token(user.id).await?;

        audit_log(
            ctx,
            &AuditEvent::LoginSuccess {
                user_id: user.id,
                email: user.email.clone(),
            },
        );

        Ok(LoginResponse {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
            token,
            refresh_token: refresh_token.token,
        })
    }

    /// Validate a session token and return the user id it names
    pub fn authenticate(&self, ctx: &AuditContext, token: &str) -> Result<Uuid, AppError> {
        validate_access_token(&self.jwt_config, token).map_err(|e| {
            audit_log(
                ctx,
                &AuditEvent::InvalidToken {
                    reason: e.to_string(),
                },
            );
            AppError::from(e)
        })
    }

    /// Replace email and password of the authenticated user
    pub async fn update_credentials(
        &self,
        ctx: &AuditContext,
        user_id: Uuid,
        request: CredentialsRequest,
    ) -> Result<UserResponse, AppError> {
        validate_credentials(&request).map_err(AppError::BadRequest)?;

        let CredentialsRequest { email, password } = request;
        let hashed_password = self.hash(password).await?;

        let user = self
            .users
            .update_user(user_id, &email, &hashed_password)
            .await
            .map_err(|e| match e {
                // The token outlived its user
                StoreError::NotFound(_) => {
                    AppError::Unauthorized("Invalid or expired token".to_string())
                }
                StoreError::Conflict(_) => {
                    AppError::Conflict("Email already registered".to_string())
                }
                other => other.into(),
            })?;

        audit_log(
            ctx,
            &AuditEvent::CredentialsChanged {
                user_id: user.id,
                email: user.email.clone(),
            },
        );

        Ok(user.into())
    }

    /// Create and store a refresh token for `user_id`, valid for 60 days
    pub async fn issue_refresh_token(&self, user_id: Uuid) -> Result<RefreshToken, AppError> {
        let token = generate_refresh_token();
        let expires_at = Utc::now() + refresh_token_ttl();

        let record = self
            .refresh_tokens
            .create_refresh_token(&token, user_id, expires_at)
            .await?;

        Ok(record)
    }

    /// Exchange a refresh token for a new one-hour session token
    ///
    /// Rejects unknown, revoked and expired tokens. Expiry is checked here,
    /// not left to the store.
    pub async fn refresh_session(
        &self,
        ctx: &AuditContext,
        presented: &str,
    ) -> Result<TokenResponse, AppError> {
        let reject = |reason: &str| {
            audit_log(
                ctx,
                &AuditEvent::InvalidToken {
                    reason: reason.to_string(),
                },
            );
            AppError::Unauthorized("Invalid refresh token".to_string())
        };

        if !is_well_formed(presented) {
            return Err(reject("malformed refresh token"));
        }

        let record = match self.refresh_tokens.get_refresh_token(presented).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => return Err(reject("unknown refresh token")),
            Err(e) => return Err(e.into()),
        };

        if record.is_revoked() {
            return Err(reject("refresh token revoked"));
        }
        if record.is_expired_at(Utc::now()) {
            return Err(reject("refresh token expired"));
        }

        let token = issue_access_token(&self.jwt_config, record.user_id, MAX_SESSION_TTL)?;

        audit_log(
            ctx,
            &AuditEvent::TokenRefresh {
                user_id: record.user_id,
            },
        );

        Ok(TokenResponse { token })
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds and moves the timestamp.
    pub async fn revoke(&self, ctx: &AuditContext, presented: &str) -> Result<(), AppError> {
        let not_found = || AppError::NotFound("Refresh token".to_string());

        if !is_well_formed(presented) {
            return Err(not_found());
        }

        match self.refresh_tokens.revoke_refresh_token(presented).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }

        audit_log(
            ctx,
            &AuditEvent::TokenRevoked {
                token_prefix: presented[..8].to_string(),
            },
        );

        Ok(())
    }

    /// Check an API key presented by the payment webhook
    pub fn authorize_webhook(&self, ctx: &AuditContext, presented: &str) -> Result<(), AppError> {
        match &self.webhook_key {
            Some(key) if bool::from(key.as_bytes().ct_eq(presented.as_bytes())) => Ok(()),
            _ => {
                audit_log(
                    ctx,
                    &AuditEvent::InvalidToken {
                        reason: "webhook API key mismatch".to_string(),
                    },
                );
                Err(AppError::Unauthorized("Invalid API key".to_string()))
            }
        }
    }

    /// Grant Chirpy Red to `user_id`
    pub async fn upgrade_membership(
        &self,
        ctx: &AuditContext,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        self.users.upgrade_user(user_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => AppError::NotFound("User".to_string()),
            other => other.into(),
        })?;

        audit_log(ctx, &AuditEvent::MembershipUpgraded { user_id });
        tracing::info!(user_id = %user_id, "User upgraded to Chirpy Red");

        Ok(())
    }

    /// Delete every user; their refresh tokens go with them
    ///
    /// Callers gate this on the dev platform.
    pub async fn reset_users(&self, ctx: &AuditContext) -> Result<u64, AppError> {
        let count = self.users.delete_all_users().await?;

        audit_log(ctx, &AuditEvent::UsersReset { count });
        tracing::warn!(count, "All users deleted");

        Ok(count)
    }
}
