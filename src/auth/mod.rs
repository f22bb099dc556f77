// Authentication: session tokens, API keys, gate middleware and security events

pub mod api_key;
pub mod audit_logger;
pub mod auth_middleware;
pub mod token;
