// Security event logging

use axum::http::HeaderMap;
use tracing::{error, info, warn};

/// Header carrying the client's UTC offset in minutes
pub const TIMEZONE_OFFSET_HEADER: &str = "x-timezone-offset";

/// Security event raised by the route gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityEvent {
    ApiKeyRejected,
    TokenRejected { reason: String },
    TokenRenewed { subject_id: String, expires_at: i64 },
    PanicRecovered { stage: &'static str },
}

impl SecurityEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SecurityEvent::ApiKeyRejected => "api_key_rejected",
            SecurityEvent::TokenRejected { .. } => "token_rejected",
            SecurityEvent::TokenRenewed { .. } => "token_renewed",
            SecurityEvent::PanicRecovered { .. } => "panic_recovered",
        }
    }
}

/// Caller metadata attached to security events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timezone_offset_minutes: i32,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
            timezone_offset_minutes: extract_timezone_offset(headers),
        }
    }
}

/// Extract IP address from request headers
///
/// Checks `X-Forwarded-For` first (for proxied requests), then `X-Real-IP`.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Client UTC offset in minutes; missing or unparseable values count as 0
pub fn extract_timezone_offset(headers: &HeaderMap) -> i32 {
    headers
        .get(TIMEZONE_OFFSET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Writes gate decisions to the `audit` tracing target
#[derive(Debug, Clone, Default)]
pub struct SecurityEventLogger;

impl SecurityEventLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log(&self, event: &SecurityEvent, path: &str, meta: &RequestMeta) {
        let ip = meta.ip_address.as_deref();
        let ua = meta.user_agent.as_deref();
        match event {
            SecurityEvent::ApiKeyRejected => {
                warn!(
                    target: "audit",
                    event = event.name(),
                    path = %path,
                    ip_address = ?ip,
                    user_agent = ?ua,
                    tz_offset = meta.timezone_offset_minutes,
                    "API key rejected"
                );
            }
            SecurityEvent::TokenRejected { reason } => {
                warn!(
                    target: "audit",
                    event = event.name(),
                    path = %path,
                    ip_address = ?ip,
                    user_agent = ?ua,
                    tz_offset = meta.timezone_offset_minutes,
                    reason = %reason,
                    "Access token rejected"
                );
            }
            SecurityEvent::TokenRenewed { subject_id, expires_at } => {
                info!(
                    target: "audit",
                    event = event.name(),
                    path = %path,
                    subject_id = %subject_id,
                    expires_at = expires_at,
                    "Access token renewed"
                );
            }
            SecurityEvent::PanicRecovered { stage } => {
                error!(
                    target: "audit",
                    event = event.name(),
                    path = %path,
                    stage = stage,
                    ip_address = ?ip,
                    "Recovered from panic in request pipeline"
                );
            }
        }
    }
}
