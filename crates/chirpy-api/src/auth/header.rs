//! Authorization header parsing
//!
//! Both schemes share one shape: `<Scheme> <credential>`, split on
//! whitespace, exactly two fields, scheme matched case-sensitively.

use axum::http::{header, HeaderMap};
use thiserror::Error;

/// Scheme word for session and refresh tokens
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme word for webhook API keys
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Any problem with the Authorization header
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Missing or malformed Authorization header")]
    MissingOrMalformed,
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, BEARER_SCHEME)
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, API_KEY_SCHEME)
}

fn extract_credential(headers: &HeaderMap, scheme: &str) -> Result<String, HeaderError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(HeaderError::MissingOrMalformed)?;

    let mut fields = value.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(s), Some(credential), None) if s == scheme => Ok(credential.to_string()),
        _ => Err(HeaderError::MissingOrMalformed),
    }
}
