//! Capabilities the chart component needs from the charting/query stack.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::chart::expression::{AggregateExpression, SensorCategory, TimeWindow};
use crate::chart::surface::ChartSurfaces;
use crate::chart::visualization::{transform_aggregates_for_visualization, VisualizationData};
use crate::error::{AppError, AppResult};
use crate::tsi::models::RawAggregateResult;
use crate::tsi::TsiClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Legend {
    #[default]
    Compact,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderOptions {
    pub legend: Legend,
}

impl RenderOptions {
    #[must_use]
    pub fn compact() -> Self {
        Self {
            legend: Legend::Compact,
        }
    }
}

pub trait LineChart: Send + Sync {
    /// Replace the chart contents. `expressions` supply per-series styling.
    ///
    /// # Errors
    ///
    /// Returns an error if the target can no longer be drawn to.
    fn render(
        &self,
        data: VisualizationData,
        options: &RenderOptions,
        expressions: &[AggregateExpression],
    ) -> AppResult<()>;
}

#[async_trait]
pub trait ChartSdk: Send + Sync {
    /// Bind a line chart to the render target named `target`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no such target exists.
    fn create_line_chart(&self, target: &str) -> AppResult<Arc<dyn LineChart>>;

    fn build_aggregate_expression(
        &self,
        category: SensorCategory,
        predicate: String,
        window: TimeWindow,
    ) -> AggregateExpression {
        AggregateExpression::for_category(category, predicate, window)
    }

    /// Submit all expressions as one batch.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TsiApi` if the query service rejects or fails the batch.
    async fn fetch_aggregates(
        &self,
        token: &str,
        endpoint: &str,
        expressions: &[AggregateExpression],
    ) -> AppResult<RawAggregateResult>;

    /// # Errors
    ///
    /// Returns `AppError::TsiApi` if the raw result does not line up with `expressions`.
    fn transform_for_visualization(
        &self,
        raw: &RawAggregateResult,
        expressions: &[AggregateExpression],
    ) -> AppResult<VisualizationData> {
        transform_aggregates_for_visualization(raw, expressions)
    }
}

/// TSI query client plus local render targets.
pub struct TsiSdk {
    client: TsiClient,
    surfaces: Arc<ChartSurfaces>,
}

impl TsiSdk {
    #[must_use]
    pub fn new(client: TsiClient, surfaces: Arc<ChartSurfaces>) -> Self {
        Self { client, surfaces }
    }
}

#[async_trait]
impl ChartSdk for TsiSdk {
    fn create_line_chart(&self, target: &str) -> AppResult<Arc<dyn LineChart>> {
        let surface: Arc<dyn LineChart> = self
            .surfaces
            .get(target)
            .ok_or_else(|| AppError::NotFound(format!("Chart target '{target}' not found")))?;
        Ok(surface)
    }

    async fn fetch_aggregates(
        &self,
        token: &str,
        endpoint: &str,
        expressions: &[AggregateExpression],
    ) -> AppResult<RawAggregateResult> {
        let queries: Vec<serde_json::Value> =
            expressions.iter().map(AggregateExpression::to_tsx).collect();
        self.client.get_aggregates(token, endpoint, &queries).await
    }
}
