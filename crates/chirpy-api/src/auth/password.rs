//! Credential hashing
//!
//! Passwords are stored only as Argon2id PHC strings
//! (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`). The string carries its own
//! salt and cost, which is all `verify_password` needs.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// The stored value is not a PHC string argon2 can read
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id cost parameters
///
/// The default is 64 MiB, one pass, two lanes and a 32-byte digest. Tests
/// drop `memory_cost` to a few hundred KiB.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// KiB of memory per hash
    pub memory_cost: u32,
    /// Passes over memory
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
    /// Digest length in bytes; `None` keeps argon2's default
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 64 * 1024,
            time_cost: 1,
            parallelism: 2,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash with the default cost; each call draws a new 16-byte salt
///
/// ```no_run
/// use chirpy_api::auth::password::{hash_password, verify_password};
///
/// let stored = hash_password("pa$$word").unwrap();
/// assert!(verify_password("pa$$word", &stored).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    config
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
}

/// Check `password` against a stored PHC string
///
/// A mismatch is `Ok(false)`, not an error. Only a hash that cannot be
/// parsed, or an argon2 failure other than a mismatch, is `Err`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}
