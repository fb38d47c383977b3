//! Security audit logging for authentication events
//!
//! Every event is logged at INFO level with the "audit" target so it can be
//! filtered and routed separately from application logs, e.g.
//! `RUST_LOG=audit=info,chirpy_api=warn`.
//!
//! # Example
//!
//! ```ignore
//! use chirpy_api::audit::{AuditContext, AuditEvent, audit_log};
//!
//! let ctx = AuditContext::from_headers(request.headers());
//! audit_log(&ctx, &AuditEvent::LoginSuccess { user_id, email });
//! ```
//!
//! Author: bailey4770

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events for authentication and authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// New account created
    RegistrationSuccess { user_id: Uuid, email: String },

    /// Account creation rejected
    RegistrationFailure { email: String, reason: String },

    /// Successful login, session and refresh token issued
    LoginSuccess { user_id: Uuid, email: String },

    /// Failed login; `reason` stays in the logs and never reaches the client
    LoginFailure { email: String, reason: String },

    /// Session token minted from a refresh token
    TokenRefresh { user_id: Uuid },

    /// Refresh token revoked; only a prefix of the token is recorded
    TokenRevoked { token_prefix: String },

    /// Email and password replaced
    CredentialsChanged { user_id: Uuid, email: String },

    /// Rejected session, refresh token or API key
    InvalidToken { reason: String },

    /// Chirpy Red granted through the payment webhook
    MembershipUpgraded { user_id: Uuid },

    /// Every user removed through the dev reset endpoint
    UsersReset { count: u64 },

    /// Request refused before reaching its handler
    AccessDenied { resource: String, reason: String },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::TokenRefresh { .. } => "Token refresh",
            AuditEvent::TokenRevoked { .. } => "Refresh token revoked",
            AuditEvent::CredentialsChanged { .. } => "Credentials changed",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::MembershipUpgraded { .. } => "Membership upgraded",
            AuditEvent::UsersReset { .. } => "Users reset",
            AuditEvent::AccessDenied { .. } => "Access denied",
        }
    }
}

/// Request metadata attached to every audit record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    /// Client IP address (extracted from proxy headers)
    pub ip_address: Option<String>,
    /// User agent string
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is serialized to JSON so log aggregators can index it:
///
/// ```json
/// {"event_type":"login_success","user_id":"550e8400-...","email":"user@example.com"}
/// ```
pub fn audit_log(ctx: &AuditContext, event: &AuditEvent) {
    let timestamp: DateTime<Utc> = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %timestamp,
        event = %event_json,
        ip_address = ?ctx.ip_address,
        user_agent = ?ctx.user_agent,
        "{}",
        event.summary()
    );
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    // Take the first IP in the chain (client IP)
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::LoginSuccess {
            user_id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"login_success\""));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        let ctx = AuditContext {
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Test Agent".to_string()),
        };

        audit_log(
            &ctx,
            &AuditEvent::LoginFailure {
                email: "test@example.com".to_string(),
                reason: "password mismatch".to_string(),
            },
        );
        audit_log(&AuditContext::default(), &AuditEvent::TokenRefresh { user_id: Uuid::new_v4() });
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            "Mozilla/5.0 (Test)".parse().unwrap(),
        );

        let ctx = AuditContext::from_headers(&headers);
        assert_eq!(ctx.user_agent, Some("Mozilla/5.0 (Test)".to_string()));
        assert_eq!(ctx.ip_address, None);
    }
}
