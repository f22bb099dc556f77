// Axum middleware running the route gate in front of every handler

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::api::responses::ApiError;
use crate::core::errors::GateError;
use crate::gate::{AppIdentity, GateDecision, RequestView, RouteGate};

/// Gate middleware function
///
/// Evaluates the pipeline on the request head. On `Forward`, the verified
/// claims and app identity go into request extensions and the gate's
/// response headers are merged into the handler's response.
pub async fn route_gate(
    State(gate): State<Arc<RouteGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = {
        let view = RequestView {
            method: request.method(),
            path: request.uri().path(),
            headers: request.headers(),
        };
        gate.evaluate(&view, Utc::now().timestamp_millis())
    };

    match decision {
        GateDecision::Halt { status, headers } => {
            let mut response = halt_response(status);
            response.headers_mut().extend(headers);
            response
        }
        GateDecision::Forward(ctx) => {
            if let Some(claims) = ctx.claims {
                request.extensions_mut().insert(claims);
            }
            if let Some(app_name) = ctx.app_name {
                request.extensions_mut().insert(AppIdentity(app_name));
            }

            let mut response = next.run(request).await;
            response.headers_mut().extend(ctx.response_headers);
            response
        }
    }
}

fn halt_response(status: StatusCode) -> Response {
    match status {
        StatusCode::NO_CONTENT => (status, Body::empty()).into_response(),
        StatusCode::UNAUTHORIZED => ApiError::from(GateError::InvalidToken).into_response(),
        StatusCode::FORBIDDEN => ApiError::from(GateError::InvalidApiKey).into_response(),
        _ => ApiError::new(status, "Internal error".to_string()).into_response(),
    }
}
