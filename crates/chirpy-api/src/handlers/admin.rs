//! Maintenance endpoints for local development
//!
//! Author: bailey4770

use crate::audit::AuditContext;
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    /// Number of users removed
    pub deleted_users: u64,
}

/// Delete every user and refresh token
///
/// Only mounted behind `require_dev_platform`; any other platform gets 403.
#[utoipa::path(
    post,
    path = "/admin/reset",
    tag = "admin",
    responses(
        (status = 200, description = "Store emptied", body = ResetResponse),
        (status = 403, description = "Not running on the dev platform", body = crate::error::ApiError),
        (status = 500, description = "Store failure", body = crate::error::ApiError),
    )
)]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let ctx = AuditContext::from_headers(&headers);
    let deleted_users = state.auth.reset_users(&ctx).await?;

    Ok(Json(ResetResponse { deleted_users }))
}
