use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chart::{ChartStatus, RenderedChart, SensorInputChanges};
use crate::common::AppState;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorUpdateResponse {
    /// Whether the update started a chart render
    pub triggered: bool,
    /// Why the input gate could not be evaluated, when a list it reached was never set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_fault: Option<String>,
}

/// Update the sensor id lists shown on the chart
///
/// Lists omitted from the body keep their current value. The chart is
/// re-rendered in the background once a token is held and all three lists
/// are non-empty. The lists are stored even when the gate faults on a list
/// that was never set; the fault is reported in `gate_fault`.
#[utoipa::path(
    put,
    path = "/api/chart/sensors",
    request_body = SensorInputChanges,
    responses(
        (status = 200, description = "Sensor ids applied", body = SensorUpdateResponse),
    ),
    tag = "chart"
)]
pub async fn update_sensors(
    State(state): State<AppState>,
    Json(changes): Json<SensorInputChanges>,
) -> AppResult<Json<SensorUpdateResponse>> {
    let response = match state.chart.apply_changes(changes).await {
        Ok(task) => SensorUpdateResponse {
            triggered: task.is_some(),
            gate_fault: None,
        },
        Err(AppError::BadRequest(fault)) => SensorUpdateResponse {
            triggered: false,
            gate_fault: Some(fault),
        },
        Err(e) => return Err(e),
    };

    Ok(Json(response))
}

/// Get the currently rendered chart
#[utoipa::path(
    get,
    path = "/api/chart",
    responses(
        (status = 200, description = "Rendered chart", body = RenderedChart),
        (status = 404, description = "Nothing rendered yet"),
    ),
    tag = "chart"
)]
pub async fn get_chart(State(state): State<AppState>) -> AppResult<Json<RenderedChart>> {
    let chart = state.surface.current().ok_or_else(|| {
        AppError::NotFound(format!(
            "No chart rendered into '{}' yet",
            state.surface.target()
        ))
    })?;

    Ok(Json((*chart).clone()))
}

/// Get the state of the most recent chart render
#[utoipa::path(
    get,
    path = "/api/chart/status",
    responses(
        (status = 200, description = "Chart status", body = ChartStatus),
    ),
    tag = "chart"
)]
pub async fn get_status(State(state): State<AppState>) -> Json<ChartStatus> {
    Json(state.chart.status())
}
