pub mod chart;
pub mod health;

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        health::readyz,
        chart::update_sensors,
        chart::get_chart,
        chart::get_status,
    ),
    components(
        schemas(
            chart::SensorUpdateResponse,
            crate::chart::SensorInputChanges,
            crate::chart::ChartStatus,
            crate::chart::RenderedChart,
            crate::chart::surface::SeriesStyle,
            crate::chart::VisualizationData,
            crate::chart::visualization::Series,
            crate::chart::visualization::SeriesPoint,
            crate::chart::RenderOptions,
            crate::chart::sdk::Legend,
            crate::chart::expression::AggregationType,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "chart", description = "Facility sensor chart"),
    ),
    info(
        title = "TSI Chart API",
        description = "Time-series chart of facility motion, light and temperature sensors",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/chart", get(chart::get_chart))
        .route("/chart/status", get(chart::get_status))
        .route("/chart/sensors", put(chart::update_sensors))
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    let health_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
