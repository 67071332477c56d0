use std::sync::Arc;

use crate::chart::{ChartSurface, TsiChart};
use crate::common::Readiness;

#[derive(Clone)]
pub struct AppState {
    pub chart: Arc<TsiChart>,
    /// Target the chart renders into; read back by the API
    pub surface: Arc<ChartSurface>,
    pub readiness: Readiness,
}

impl AppState {
    pub fn new(chart: Arc<TsiChart>, surface: Arc<ChartSurface>, readiness: Readiness) -> Self {
        Self {
            chart,
            surface,
            readiness,
        }
    }
}
