//! Refresh token generation
//!
//! Refresh tokens are opaque: 32 bytes from the OS RNG, hex-encoded into
//! 64 lowercase characters. Their lifecycle lives in `AuthService`.

use chrono::Duration;
use rand::{rngs::OsRng, RngCore};

/// Length of the random part of the token in bytes
const REFRESH_TOKEN_BYTES: usize = 32;

/// Length of an encoded refresh token
pub const REFRESH_TOKEN_LEN: usize = REFRESH_TOKEN_BYTES * 2;

/// Lifetime of a refresh token from issuance
pub fn refresh_token_ttl() -> Duration {
    Duration::days(60)
}

/// Generate a new refresh token
///
/// Panics only if the operating system RNG is unavailable.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Cheap shape check before hitting the store
pub fn is_well_formed(token: &str) -> bool {
    token.len() == REFRESH_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
