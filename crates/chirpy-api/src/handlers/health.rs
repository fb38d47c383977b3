//! Health check handlers
//!
//! Author: bailey4770

use axum::{http::header, response::IntoResponse};

/// Liveness check
#[utoipa::path(
    get,
    path = "/api/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = String, content_type = "text/plain")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "OK")
}
