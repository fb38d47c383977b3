//! Authentication API handlers
//!
//! Registration, login, credential updates and the refresh token endpoints.
//! Refresh and revoke take the refresh token from `Authorization: Bearer`.
//!
//! Author: bailey4770

use crate::audit::AuditContext;
use crate::auth::{
    extract_bearer, AuthenticatedUser, CredentialsRequest, LoginRequest, LoginResponse,
    TokenResponse, UserResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Register a new user account
///
/// # Responses
///
/// * `201 Created` - User registered
/// * `400 Bad Request` - Malformed body, missing email or password
/// * `409 Conflict` - Email already registered
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = AuditContext::from_headers(&headers);
    let user = state.auth.register(&ctx, request).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
///
/// Returns the public profile, a session token and a refresh token.
/// Every failure returns the same 401 body.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Incorrect email or password", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = AuditContext::from_headers(&headers);
    let response = state.auth.login(&ctx, request).await?;

    Ok(Json(response))
}

/// Replace email and password of the authenticated user
#[utoipa::path(
    put,
    path = "/api/users",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Credentials updated", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ctx = AuditContext::from_headers(&headers);
    let updated = state
        .auth
        .update_credentials(&ctx, user.user_id, request)
        .await?;

    Ok(Json(updated))
}

/// Exchange a refresh token for a new session token
///
/// No rotation: the refresh token stays valid until it expires or is revoked.
#[utoipa::path(
    post,
    path = "/api/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ctx = AuditContext::from_headers(&headers);
    let refresh_token = extract_bearer(&headers)?;
    let response = state.auth.refresh_session(&ctx, &refresh_token).await?;

    Ok(Json(response))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/revoke",
    tag = "auth",
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 401, description = "Missing or malformed Authorization header", body = crate::error::ApiError),
        (status = 404, description = "Unknown refresh token", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ctx = AuditContext::from_headers(&headers);
    let refresh_token = extract_bearer(&headers)?;
    state.auth.revoke(&ctx, &refresh_token).await?;

    Ok(StatusCode::NO_CONTENT)
}
