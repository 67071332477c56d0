use axum::{extract::State, http::StatusCode};

use crate::common::AppState;
use crate::error::{AppError, AppResult};

/// Health check endpoint
///
/// Returns 200 OK if the service is running.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Readiness check endpoint
///
/// Returns 200 once the facility service is initialized, 503 before that.
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Facility service initialized"),
        (status = 503, description = "Still starting up"),
    ),
    tag = "health"
)]
pub async fn readyz(State(state): State<AppState>) -> AppResult<StatusCode> {
    if state.readiness.is_initialized() {
        Ok(StatusCode::OK)
    } else {
        Err(AppError::ServiceUnavailable(
            "Facility service not initialized".to_string(),
        ))
    }
}
