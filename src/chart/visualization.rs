use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::chart::expression::AggregateExpression;
use crate::error::{AppError, AppResult};
use crate::tsi::models::{AggregateNode, RawAggregateResult};

/// Chart-ready data: one series per aggregate expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct VisualizationData {
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Series {
    pub display_name: String,
    pub color: String,
    /// Event property the values were aggregated from
    pub measure: String,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SeriesPoint {
    /// Start of the bucket
    pub timestamp: DateTime<Utc>,
    /// Aggregated values keyed by aggregation name (`avg`); null for empty buckets
    pub values: BTreeMap<String, Option<f64>>,
}

/// Pair each raw aggregate response with the expression that produced it.
///
/// # Errors
///
/// Returns `AppError::TsiApi` when the number of responses does not match the
/// number of expressions, a bucket timestamp cannot be parsed, or a response
/// carries split-by levels.
pub fn transform_aggregates_for_visualization(
    raw: &RawAggregateResult,
    expressions: &[AggregateExpression],
) -> AppResult<VisualizationData> {
    if raw.len() != expressions.len() {
        return Err(AppError::TsiApi(format!(
            "Expected {} aggregate responses, got {}",
            expressions.len(),
            raw.len()
        )));
    }

    let series = raw
        .iter()
        .zip(expressions)
        .map(|(response, expression)| -> AppResult<Series> {
            let points = match response.aggregates.first() {
                Some(node) => histogram_points(node, expression)?,
                None => Vec::new(),
            };

            Ok(Series {
                display_name: expression.display_name.clone(),
                color: expression.color.clone(),
                measure: expression.measure.property.clone(),
                points,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(VisualizationData { series })
}

fn histogram_points(
    node: &AggregateNode,
    expression: &AggregateExpression,
) -> AppResult<Vec<SeriesPoint>> {
    if node.aggregate.is_some() {
        return Err(AppError::TsiApi(format!(
            "Split aggregates are not supported (series '{}')",
            expression.display_name
        )));
    }

    let measures = node.measures.as_deref().unwrap_or_default();

    node.dimension
        .iter()
        .enumerate()
        .map(|(i, bucket)| -> AppResult<SeriesPoint> {
            let timestamp = bucket
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
                .ok_or_else(|| {
                    AppError::TsiApi(format!("Invalid bucket timestamp: {bucket}"))
                })?;

            let row = measures.get(i);
            let values = expression
                .measure_types
                .iter()
                .enumerate()
                .map(|(j, t)| {
                    let value = row.and_then(|r| r.get(j).copied().flatten());
                    (t.as_str().to_string(), value)
                })
                .collect();

            Ok(SeriesPoint { timestamp, values })
        })
        .collect()
}
