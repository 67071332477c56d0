//! In-memory render targets.
//!
//! A [`ChartSurface`] plays the role of the chart's host element: every render
//! replaces what it shows. Concurrent renders are not ordered; whichever
//! finishes last is what readers see.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::chart::expression::{AggregateExpression, AggregationType};
use crate::chart::sdk::{LineChart, RenderOptions};
use crate::chart::visualization::VisualizationData;
use crate::error::{AppError, AppResult};

/// Per-series styling taken from the expression that produced the series
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeriesStyle {
    pub display_name: String,
    pub color: String,
    pub measure: String,
    pub aggregations: Vec<AggregationType>,
    pub predicate: String,
}

impl From<&AggregateExpression> for SeriesStyle {
    fn from(expression: &AggregateExpression) -> Self {
        Self {
            display_name: expression.display_name.clone(),
            color: expression.color.clone(),
            measure: expression.measure.property.clone(),
            aggregations: expression.measure_types.clone(),
            predicate: expression.predicate.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenderedChart {
    /// Unique id of this render
    pub id: Uuid,
    pub target: String,
    pub rendered_at: DateTime<Utc>,
    /// Start of the plotted window (null if no series)
    pub from: Option<DateTime<Utc>>,
    /// End of the plotted window (null if no series)
    pub to: Option<DateTime<Utc>>,
    /// Bucket width, e.g. `30m`
    pub bucket_size: Option<String>,
    pub options: RenderOptions,
    pub styles: Vec<SeriesStyle>,
    pub data: VisualizationData,
}

pub struct ChartSurface {
    target: String,
    current: RwLock<Option<Arc<RenderedChart>>>,
}

impl ChartSurface {
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            current: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// What the surface currently shows, if anything has been rendered.
    #[must_use]
    pub fn current(&self) -> Option<Arc<RenderedChart>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LineChart for ChartSurface {
    fn render(
        &self,
        data: VisualizationData,
        options: &RenderOptions,
        expressions: &[AggregateExpression],
    ) -> AppResult<()> {
        let span = expressions.first().map(|e| e.search_span);
        let chart = RenderedChart {
            id: Uuid::new_v4(),
            target: self.target.clone(),
            rendered_at: Utc::now(),
            from: span.map(|s| s.from),
            to: span.map(|s| s.to),
            bucket_size: span.map(|s| s.bucket_size_label()),
            options: options.clone(),
            styles: expressions.iter().map(SeriesStyle::from).collect(),
            data,
        };

        tracing::debug!(
            target_id = %self.target,
            render_id = %chart.id,
            series = chart.styles.len(),
            "Chart rendered"
        );

        *self
            .current
            .write()
            .map_err(|_| AppError::Internal("Chart surface lock poisoned".to_string()))? =
            Some(Arc::new(chart));
        Ok(())
    }
}

/// Registry of render targets by id.
#[derive(Default)]
pub struct ChartSurfaces {
    surfaces: RwLock<HashMap<String, Arc<ChartSurface>>>,
}

impl ChartSurfaces {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target, returning the existing surface if already present.
    pub fn register(&self, target: &str) -> Arc<ChartSurface> {
        let mut surfaces = self
            .surfaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        surfaces
            .entry(target.to_string())
            .or_insert_with(|| Arc::new(ChartSurface::new(target)))
            .clone()
    }

    #[must_use]
    pub fn get(&self, target: &str) -> Option<Arc<ChartSurface>> {
        self.surfaces
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .cloned()
    }
}
