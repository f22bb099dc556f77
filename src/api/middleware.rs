// Middleware stack for observability and protection

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::error;

use crate::api::responses::ApiError;

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Tracing middleware
///
/// Logs method, path, status and latency for every request.
pub fn tracing_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Body size limit middleware; returns 413 when exceeded
pub fn body_size_limit_layer(limit: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(limit)
}

/// Global handler timeout
pub fn timeout_layer(timeout: Duration) -> tower::timeout::TimeoutLayer {
    tower::timeout::TimeoutLayer::new(timeout)
}

/// Converts a handler panic into a generic 500
pub fn panic_recovery_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(target: "audit", event = "panic_recovered", stage = "handler", detail = %detail, "Recovered from handler panic");

    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()).into_response()
}
