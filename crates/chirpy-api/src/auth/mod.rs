//! Authentication and authorization module
//!
//! - Password hashing with Argon2id
//! - Session token issuance and validation (HS256 JWT)
//! - Authorization header parsing for bearer tokens and API keys
//! - Opaque refresh tokens
//! - Middleware for request authentication
//! - Authentication service composing the flows above

pub mod header;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh;
pub mod service;

pub use header::{extract_api_key, extract_bearer, HeaderError};
pub use jwt::{issue_access_token, validate_access_token, Claims, JwtConfig, JwtError};
pub use middleware::{auth_middleware, require_dev_platform, AuthenticatedUser};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use refresh::generate_refresh_token;
pub use service::{
    AuthService, CredentialsRequest, LoginRequest, LoginResponse, TokenResponse, UserResponse,
};
