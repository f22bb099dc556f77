// Request handlers for service endpoints

use axum::{extract::State, response::Json, Extension};
use tracing::debug;

use crate::api::responses::{ApiError, HealthResponse, VersionResponse};
use crate::api::AppState;
use crate::core::errors::GateError;
use crate::core::models::SessionClaims;

/// Service name reported by `GET /`
pub const SERVICE_KEY: &str = "gatekeeper";

/// GET /
pub async fn version_handler(State(app_state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        code: 0,
        key: SERVICE_KEY.to_string(),
        data: app_state.version.to_string(),
    })
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /session
///
/// Echoes the claims the gate verified (and possibly renewed) for this request.
pub async fn session_handler(
    claims: Option<Extension<SessionClaims>>,
) -> Result<Json<SessionClaims>, ApiError> {
    let Extension(claims) = claims.ok_or(GateError::InvalidToken)?;
    debug!(subject_id = %claims.subject_id, "Session introspection");
    Ok(Json(claims))
}
