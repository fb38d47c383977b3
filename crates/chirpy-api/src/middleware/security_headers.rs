//! Security headers middleware
//!
//! Applied to the `/api` routes only. Their responses carry credentials
//! and are never rendered by a browser, so the policy is strict:
//! - Cache-Control: no-store - Session and refresh tokens must not be cached
//! - X-Content-Type-Options: nosniff
//! - X-Frame-Options: DENY
//! - Content-Security-Policy: default-src 'none'
//! - Referrer-Policy: no-referrer
//!
//! Author: bailey4770

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Add security headers to every API response, errors included
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}
