//! JWT session token issuance and validation
//!
//! Implements JWT-based authentication with HMAC-SHA256 signing.
//! Session tokens carry only the issuer, subject (user id), issued-at and
//! expiry claims; nothing about them is stored server-side.

use chirpy_core::config::AuthConfig;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer (always "chirpy" unless configured otherwise)
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Unexpected signing algorithm: {0:?}")]
    UnexpectedAlgorithm(Algorithm),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Subject is not a valid user id")]
    InvalidSubject,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// JWT Configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token issuer identifier
    pub issuer: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "chirpy".to_string(),
        }
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.jwt_issuer.clone(),
        }
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

fn now_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue a signed session token for `user_id`, valid for `ttl`
///
/// The issuer does not clamp `ttl`; callers apply the session policy first.
/// A zero `ttl` yields a token that is already expired.
///
/// # Example
///
/// ```no_run
/// use chirpy_api::auth::jwt::{issue_access_token, validate_access_token, JwtConfig};
/// use std::time::Duration;
/// use uuid::Uuid;
///
/// let config = JwtConfig::new("secret");
/// let user_id = Uuid::new_v4();
/// let token = issue_access_token(&config, user_id, Duration::from_secs(3600)).unwrap();
/// assert_eq!(validate_access_token(&config, &token).unwrap(), user_id);
/// ```
pub fn issue_access_token(
    config: &JwtConfig,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, JwtError> {
    let now = now_secs()?;

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl.as_secs(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a session token and return the user id it was issued for
///
/// Runs in two steps. First the header must name HS256 and the signature must
/// verify against the configured secret. Then the expiry and the subject are
/// checked on the decoded claims.
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Uuid, JwtError> {
    let header = decode_header(token).map_err(|_| JwtError::InvalidToken)?;
    if header.alg != Algorithm::HS256 {
        return Err(JwtError::UnexpectedAlgorithm(header.alg));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.validate_exp = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?
    .claims;

    if claims.exp <= now_secs()? {
        return Err(JwtError::ExpiredToken);
    }

    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidSubject)
}
