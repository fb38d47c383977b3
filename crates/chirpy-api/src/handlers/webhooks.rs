//! Payment provider webhooks
//!
//! Author: bailey4770

use crate::audit::AuditContext;
use crate::auth::extract_api_key;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// The only event that changes state
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// Webhook payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookData {
    pub user_id: Uuid,
}

/// Grant Chirpy Red after a successful payment
///
/// Authenticated with `Authorization: ApiKey <key>`, checked before the
/// body is decoded. Events other than `user.upgraded` are acknowledged and
/// ignored.
#[utoipa::path(
    post,
    path = "/api/polka/webhooks",
    tag = "webhooks",
    request_body = WebhookRequest,
    responses(
        (status = 204, description = "Event accepted"),
        (status = 400, description = "Malformed body", body = crate::error::ApiError),
        (status = 401, description = "Missing or wrong API key", body = crate::error::ApiError),
        (status = 404, description = "Unknown user", body = crate::error::ApiError),
    ),
    security(
        ("api_key" = [])
    )
)]
pub async fn polka_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = AuditContext::from_headers(&headers);
    let key = extract_api_key(&headers)?;
    state.auth.authorize_webhook(&ctx, &key)?;

    let Json(request) = payload?;

    if request.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %request.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    state
        .auth
        .upgrade_membership(&ctx, request.data.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
