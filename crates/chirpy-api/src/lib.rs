//! Chirpy API - authentication backend
//!
//! HTTP endpoints for registration, login, credential updates, refresh
//! token exchange and revocation, the payment webhook, and a dev-only
//! reset endpoint.

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use crate::auth::{CredentialsRequest, LoginRequest, LoginResponse, TokenResponse, UserResponse};
use crate::error::ApiError;
use crate::handlers::admin::ResetResponse;
use crate::handlers::webhooks::{WebhookData, WebhookRequest};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use chirpy_core::config::AppConfig;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document served at `/api-docs/openapi.json`
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::update_user_handler,
        handlers::auth::refresh_handler,
        handlers::auth::revoke_handler,
        handlers::webhooks::polka_webhook_handler,
        handlers::admin::reset_handler,
    ),
    components(schemas(
        CredentialsRequest,
        LoginRequest,
        UserResponse,
        LoginResponse,
        TokenResponse,
        WebhookRequest,
        WebhookData,
        ResetResponse,
        ApiError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token lifecycle"),
        (name = "webhooks", description = "Payment provider callbacks"),
        (name = "health", description = "Liveness"),
        (name = "admin", description = "Dev-only maintenance"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            // Sent as `Authorization: ApiKey <key>`
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    let api = routes::api_routes(state.clone()).layer(axum::middleware::from_fn(
        middleware::security_headers_middleware,
    ));
    let admin = routes::admin_routes(state.clone()).layer(axum::middleware::from_fn(
        middleware::security_headers_middleware,
    ));

    Router::new()
        .nest("/api", api)
        .nest("/admin", admin)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Router over an in-memory store with development defaults
pub fn create_router_for_testing() -> Router {
    create_router(Arc::new(AppState::in_memory(testing_config())))
}

/// Development configuration with a known webhook key
pub fn testing_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.platform = chirpy_core::config::DEV_PLATFORM.to_string();
    config.auth.jwt_secret = chirpy_core::config::DEV_JWT_SECRET.to_string();
    config.auth.polka_key = Some("test-polka-key".to_string());
    config
}
