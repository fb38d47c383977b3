/// Authentication middleware for protecting routes
///
/// Extracts and validates the session token from the Authorization header.
/// On success, adds the authenticated user to request extensions.
use super::header::extract_bearer;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user extracted from a session token
///
/// Handlers behind `auth_middleware` read it with
/// `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Subject of the validated token
    pub user_id: Uuid,
}

/// Require a valid `Authorization: Bearer <token>` header
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, routing::put, Extension, Router};
/// use chirpy_api::auth::middleware::{auth_middleware, AuthenticatedUser};
///
/// async fn protected(Extension(user): Extension<AuthenticatedUser>) -> String {
///     user.user_id.to_string()
/// }
///
/// let app = Router::new()
///     .route("/api/users", put(protected))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = AuditContext::from_headers(request.headers());

    let token = extract_bearer(request.headers()).map_err(|e| {
        audit_log(
            &ctx,
            &AuditEvent::InvalidToken {
                reason: e.to_string(),
            },
        );
        AppError::from(e)
    })?;

    let user_id = state.auth.authenticate(&ctx, &token)?;
    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Refuse the request with 403 unless the server runs on the dev platform
///
/// Guards destructive maintenance routes such as `POST /admin/reset`.
pub async fn require_dev_platform(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.is_dev() {
        let ctx = AuditContext::from_headers(request.headers());
        audit_log(
            &ctx,
            &AuditEvent::AccessDenied {
                resource: request.uri().path().to_string(),
                reason: format!("platform is {:?}", state.config.server.platform),
            },
        );
        return Err(AppError::Forbidden(
            "Only allowed on the dev platform".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
