//! API error handling
//!
//! Author: bailey4770

use crate::auth::header::HeaderError;
use crate::auth::jwt::JwtError;
use crate::auth::password::PasswordError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chirpy_core::StoreError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message shared by every failed login, whichever factor was wrong
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    Internal(String),
    Database(String),
}

impl AppError {
    /// The undifferentiated login failure
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            AppError::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            AppError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            AppError::Conflict(msg) => write!(f, "conflict: {msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
            AppError::Database(msg) => write!(f, "database error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::NotFound(msg) => ApiError::not_found(&msg),
            AppError::BadRequest(msg) => ApiError::bad_request(msg),
            AppError::Unauthorized(msg) => ApiError::unauthorized(msg),
            AppError::Forbidden(msg) => ApiError::forbidden(msg),
            AppError::Conflict(msg) => ApiError::conflict(msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ApiError::internal_error()
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ApiError::new("DATABASE_ERROR", "Database operation failed")
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::EncodingError(_) | JwtError::SystemTimeError(_) => {
                AppError::Internal(err.to_string())
            }
            _ => AppError::Unauthorized("Invalid or expired token".to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest("Invalid request body".to_string())
    }
}

impl From<HeaderError> for AppError {
    fn from(err: HeaderError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let (status, json) =
            body_json(AppError::Database("relation \"users\" does not exist".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "DATABASE_ERROR");
        assert!(!json.to_string().contains("relation"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_body() {
        let (status, json) = body_json(AppError::invalid_credentials()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], INVALID_CREDENTIALS);
    }

    #[test]
    fn test_jwt_errors_map_to_unauthorized() {
        let err: AppError = JwtError::ExpiredToken.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: AppError = JwtError::InvalidSignature.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AppError = StoreError::Conflict("email".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: AppError = StoreError::NotFound("token".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: AppError = HeaderError::MissingOrMalformed.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_json_rejection_uses_error_body() {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(r#"{"email":"a@b.com"}"#))
            .unwrap();
        let rejection = axum::Json::<crate::auth::CredentialsRequest>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let (status, json) = body_json(rejection.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["message"], "Invalid request body");
    }
}
