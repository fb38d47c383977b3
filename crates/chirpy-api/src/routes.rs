//! API route definitions
//!
//! Author: bailey4770

use crate::auth::middleware::{auth_middleware, require_dev_platform};
use crate::handlers::{admin, auth, health, webhooks};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Create the `/api` routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no session token required)
    let public_routes = Router::new()
        .route("/healthz", get(health::health_check))
        .route("/users", post(auth::register_handler))
        .route("/login", post(auth::login_handler))
        .route("/refresh", post(auth::refresh_handler))
        .route("/revoke", post(auth::revoke_handler))
        .route("/polka/webhooks", post(webhooks::polka_webhook_handler));

    // Protected routes (session token required)
    let protected_routes = Router::new()
        .route("/users", put(auth::update_user_handler))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Create the `/admin` routes, refused outside the dev platform
pub fn admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/reset", post(admin::reset_handler))
        .route_layer(middleware::from_fn_with_state(state, require_dev_platform))
}
