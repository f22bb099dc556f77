// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer, http::StatusCode, routing::get, BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::audit::{AuditRecorder, AuditStore};
use crate::auth::api_key::ApiKeyCipher;
use crate::auth::auth_middleware::route_gate;
use crate::auth::token::TokenCodec;
use crate::core::errors::GateError;
use crate::gate::{RouteGate, Whitelist};

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// All components are wrapped in Arc for shared ownership across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<RouteGate>,
    pub recorder: AuditRecorder,
    pub version: Arc<String>,
}

impl AppState {
    /// Build the gate from configured key material and the standard whitelist
    pub fn new(config: Config, store: Arc<dyn AuditStore>) -> Result<Self, GateError> {
        let gate = RouteGate::new(
            TokenCodec::new(config.token_signing_key.clone()),
            ApiKeyCipher::new(config.api_key_secret.clone()),
            Arc::new(Whitelist::standard()),
            &config.api_version,
        )?;
        let version = config.reported_version();

        Ok(Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            recorder: AuditRecorder::new(store),
            version: Arc::new(version),
        })
    }
}

/// Create the Axum router with service routes, `extra_routes` and middleware
///
/// Middleware stack (outermost to innermost):
/// - Request timeout (tower::timeout) with HandleErrorLayer
/// - Body size limit (tower-http::limit)
/// - Tracing (tower-http::trace)
/// - Route gate: CORS, cache control, API key and token checks, version header
/// - Panic recovery (tower-http::catch_panic) for handler panics
pub fn create_router(app_state: AppState, extra_routes: Router<AppState>) -> Router {
    let body_limit = app_state.config.body_size_limit_bytes;
    let timeout_secs = app_state.config.request_timeout_secs;

    let router = Router::new()
        .route("/", get(handlers::version_handler))
        .route("/health", get(handlers::health_handler))
        .route("/session", get(handlers::session_handler))
        .merge(extra_routes)
        .layer(middleware::panic_recovery_layer())
        .layer(axum::middleware::from_fn_with_state(
            app_state.gate.clone(),
            route_gate,
        ))
        .layer(middleware::tracing_layer())
        .layer(middleware::body_size_limit_layer(body_limit));

    // HandleErrorLayer must come BEFORE timeout to catch the timeout error
    let timeout_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            let status = if e.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, e.to_string())
        }))
        .layer(middleware::timeout_layer(Duration::from_secs(timeout_secs)))
        .into_inner();

    router.layer(timeout_stack).with_state(app_state)
}
