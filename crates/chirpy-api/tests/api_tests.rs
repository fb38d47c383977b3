//! API Integration Tests
//!
//! Every test runs against an in-memory store; no database is needed.
//!
//! Author: bailey4770

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chirpy_api::state::AppState;
use chirpy_api::{create_router, create_router_for_testing, testing_config};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, email: &str, password: &str) -> Value {
    let (status, json) = send(
        app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({"email": email, "password": password})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({"email": email, "password": password})),
        ),
    )
    .await
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn raw_request(uri: &str, authorization: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    builder.body(Body::from(body)).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

// =============================================================================
// Registration Tests
// =============================================================================

#[tokio::test]
async fn test_register_returns_public_profile() {
    let app = create_router_for_testing();

    let json = register(&app, "saul@bettercall.com", "123456").await;

    assert_eq!(json["email"], "saul@bettercall.com");
    assert_eq!(json["is_chirpy_red"], false);
    assert!(json["id"].is_string());
    assert!(json.get("hashed_password").is_none());
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_router_for_testing();
    register(&app, "walt@breakingbad.com", "123456").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({"email": "walt@breakingbad.com", "password": "other"})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_empty_password() {
    let app = create_router_for_testing();

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({"email": "walt@breakingbad.com", "password": ""})),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_login_failures_share_one_response() {
    let app = create_router_for_testing();
    register(&app, "saul@bettercall.com", "123456").await;

    let (wrong_password_status, wrong_password) =
        login(&app, "saul@bettercall.com", "654321").await;
    let (unknown_email_status, unknown_email) =
        login(&app, "kim@bettercall.com", "123456").await;

    assert_eq!(wrong_password_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_login_returns_tokens() {
    let app = create_router_for_testing();
    let user = register(&app, "saul@bettercall.com", "123456").await;

    let (status, json) = login(&app, "saul@bettercall.com", "123456").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], user["id"]);
    assert!(json["token"].as_str().unwrap().split('.').count() == 3);

    let refresh = json["refresh_token"].as_str().unwrap();
    assert_eq!(refresh.len(), 64);
    assert!(refresh.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_login_with_missing_field_is_json_bad_request() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("POST", "/api/login", None, Some(json!({"email": "a@b.com"}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_register_with_malformed_body_is_json_bad_request() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, raw_request("/api/users", None, "{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[tokio::test]
async fn test_auth_pipeline() {
    let app = create_router_for_testing();
    register(&app, "walt@breakingbad.com", "123456").await;

    let (status, session) = login(&app, "walt@breakingbad.com", "123456").await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap().to_string();
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    // Update credentials with the session token
    let (status, updated) = send(
        &app,
        create_json_request(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({"email": "heisenberg@breakingbad.com", "password": "losPollos"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "heisenberg@breakingbad.com");

    // Old password no longer works, new one does
    let (status, _) = login(&app, "heisenberg@breakingbad.com", "123456").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "heisenberg@breakingbad.com", "losPollos").await;
    assert_eq!(status, StatusCode::OK);

    // Refresh token mints a new session token
    let (status, refreshed) = send(
        &app,
        create_json_request("POST", "/api/refresh", Some(&bearer(&refresh_token)), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(refreshed["token"].is_string());

    // The refresh token is not a session token
    let (status, _) = send(
        &app,
        create_json_request(
            "PUT",
            "/api/users",
            Some(&bearer(&refresh_token)),
            Some(json!({"email": "x@breakingbad.com", "password": "x"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Revoke, then refresh fails
    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/revoke", Some(&bearer(&refresh_token)), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/refresh", Some(&bearer(&refresh_token)), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Authorization Header Tests
// =============================================================================

#[tokio::test]
async fn test_update_requires_bearer() {
    let app = create_router_for_testing();
    let body = json!({"email": "a@b.com", "password": "pw"});

    for authorization in [None, Some("Token abc"), Some("Bearer"), Some("Bearer not.a.jwt")] {
        let (status, _) = send(
            &app,
            create_json_request("PUT", "/api/users", authorization, Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
    }
}

#[tokio::test]
async fn test_refresh_without_header() {
    let app = create_router_for_testing();

    let (status, _) = send(&app, create_json_request("POST", "/api/refresh", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoke_unknown_token() {
    let app = create_router_for_testing();
    let unknown = "0".repeat(64);

    let (status, json) = send(
        &app,
        create_json_request("POST", "/api/revoke", Some(&bearer(&unknown)), None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

// =============================================================================
// Webhook Tests
// =============================================================================

#[tokio::test]
async fn test_webhook_upgrades_user() {
    let app = create_router_for_testing();
    let user = register(&app, "saul@bettercall.com", "123456").await;
    let payload = json!({"event": "user.upgraded", "data": {"user_id": user["id"]}});

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/polka/webhooks",
            Some("ApiKey test-polka-key"),
            Some(payload),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, json) = login(&app, "saul@bettercall.com", "123456").await;
    assert_eq!(json["is_chirpy_red"], true);
}

#[tokio::test]
async fn test_webhook_rejects_wrong_key() {
    let app = create_router_for_testing();
    let payload = json!({"event": "user.upgraded", "data": {"user_id": uuid::Uuid::new_v4()}});

    for authorization in [None, Some("ApiKey wrong"), Some("Bearer test-polka-key")] {
        let (status, _) = send(
            &app,
            create_json_request("POST", "/api/polka/webhooks", authorization, Some(payload.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
    }
}

#[tokio::test]
async fn test_webhook_checks_key_before_body() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, raw_request("/api/polka/webhooks", None, "not json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        raw_request("/api/polka/webhooks", Some("ApiKey wrong"), r#"{"event":1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A valid key with a bad body is a client error
    let (status, json) = send(
        &app,
        raw_request("/api/polka/webhooks", Some("ApiKey test-polka-key"), "not json"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_webhook_ignores_other_events_and_unknown_users() {
    let app = create_router_for_testing();
    let unknown = uuid::Uuid::new_v4();

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/polka/webhooks",
            Some("ApiKey test-polka-key"),
            Some(json!({"event": "user.payment_failed", "data": {"user_id": unknown}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/api/polka/webhooks",
            Some("ApiKey test-polka-key"),
            Some(json!({"event": "user.upgraded", "data": {"user_id": unknown}})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Admin Reset Tests
// =============================================================================

#[tokio::test]
async fn test_reset_on_dev_platform_deletes_users() {
    let app = create_router_for_testing();
    register(&app, "saul@bettercall.com", "123456").await;
    let (_, session) = login(&app, "saul@bettercall.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    let (status, json) = send(&app, create_json_request("POST", "/admin/reset", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted_users"], 1);

    let (status, _) = login(&app, "saul@bettercall.com", "123456").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        create_json_request("POST", "/api/refresh", Some(&bearer(&refresh_token)), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The email is free again
    register(&app, "saul@bettercall.com", "123456").await;
}

#[tokio::test]
async fn test_reset_forbidden_outside_dev() {
    let mut config = testing_config();
    config.server.platform = "production".to_string();
    config.auth.jwt_secret = "production-secret".to_string();
    let app = create_router(Arc::new(AppState::in_memory(config)));
    register(&app, "saul@bettercall.com", "123456").await;

    let (status, json) = send(&app, create_json_request("POST", "/admin/reset", None, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, _) = login(&app, "saul@bettercall.com", "123456").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api-docs/openapi.json", None, None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/login"].is_object());
}
