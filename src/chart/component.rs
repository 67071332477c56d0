//! The facility sensor chart.
//!
//! [`TsiChart`] holds the three sensor-id inputs and the TSI token. Whenever
//! an input changes, or the token arrives, the input gate is re-evaluated;
//! once everything is present the chart is rebuilt from scratch and rendered
//! in a background task. Renders are never cancelled: if a second trigger
//! fires while a first render is in flight, both complete and the later one
//! wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::auth::TokenProvider;
use crate::chart::expression::{SensorCategory, TimeWindow};
use crate::chart::predicate::build_predicate_string;
use crate::chart::sdk::{ChartSdk, RenderOptions};
use crate::common::Readiness;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Source of "now" for the lookback window.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Background render started by the input gate.
pub type RenderTask = JoinHandle<AppResult<()>>;

#[derive(Debug, Clone)]
pub struct ChartSettings {
    /// TSI environment FQDN queried for aggregates
    pub endpoint: String,
    /// Resource the access token is requested for
    pub token_resource: String,
    pub lookback_days: i64,
    /// Render target the chart is drawn into
    pub target: String,
}

impl ChartSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config.tsi_fqdn.clone(),
            token_resource: config.tsi_api_resource.clone(),
            lookback_days: config.tsi_how_many_days,
            target: config.chart_target.clone(),
        }
    }
}

/// Sensor ids supplied by the parent view. `None` means never set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorInputs {
    pub motion_sensor_ids: Option<Vec<String>>,
    pub light_sensor_ids: Option<Vec<String>>,
    pub temp_sensor_ids: Option<Vec<String>>,
}

impl SensorInputs {
    #[must_use]
    pub fn ids(&self, category: SensorCategory) -> Option<&[String]> {
        match category {
            SensorCategory::Motion => self.motion_sensor_ids.as_deref(),
            SensorCategory::Light => self.light_sensor_ids.as_deref(),
            SensorCategory::Temperature => self.temp_sensor_ids.as_deref(),
        }
    }
}

/// Partial update of the inputs; absent lists are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorInputChanges {
    pub motion_sensor_ids: Option<Vec<String>>,
    pub light_sensor_ids: Option<Vec<String>>,
    pub temp_sensor_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChartStatus {
    #[default]
    Idle,
    AwaitingToken,
    Loading {
        generation: u64,
    },
    Rendered {
        generation: u64,
        rendered_at: DateTime<Utc>,
    },
    Failed {
        /// Render attempt that failed; null when the token could not be acquired
        generation: Option<u64>,
        message: String,
    },
}

/// Decide whether the chart can be rendered from the current state.
///
/// The checks run in a fixed order and stop at the first one that fails:
/// token, motion set, motion non-empty, light non-empty, temperature non-empty.
/// Only the motion list is checked for being unset before use. An unset light
/// or temperature list reached by that order is reported as an error rather
/// than treated as empty.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when an unset light or temperature list is reached.
pub fn evaluate_gate(token_retrieved: bool, inputs: &SensorInputs) -> AppResult<bool> {
    if !token_retrieved {
        return Ok(false);
    }

    let Some(motion) = &inputs.motion_sensor_ids else {
        return Ok(false);
    };
    if motion.is_empty() {
        return Ok(false);
    }

    let light = inputs
        .light_sensor_ids
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("lightSensorIds is not set".to_string()))?;
    if light.is_empty() {
        return Ok(false);
    }

    let temp = inputs
        .temp_sensor_ids
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("tempSensorIds is not set".to_string()))?;
    Ok(!temp.is_empty())
}

pub struct TsiChart {
    settings: ChartSettings,
    sdk: Arc<dyn ChartSdk>,
    tokens: Arc<dyn TokenProvider>,
    clock: Clock,
    inputs: RwLock<SensorInputs>,
    token: RwLock<Option<String>>,
    token_retrieved: AtomicBool,
    generation: AtomicU64,
    status: watch::Sender<ChartStatus>,
}

impl TsiChart {
    #[must_use]
    pub fn new(
        settings: ChartSettings,
        sdk: Arc<dyn ChartSdk>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let (status, _) = watch::channel(ChartStatus::Idle);
        Self {
            settings,
            sdk,
            tokens,
            clock: Arc::new(Utc::now),
            inputs: RwLock::new(SensorInputs::default()),
            token: RwLock::new(None),
            token_retrieved: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            status,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_token_retrieved(&self) -> bool {
        self.token_retrieved.load(Ordering::SeqCst)
    }

    pub async fn inputs(&self) -> SensorInputs {
        self.inputs.read().await.clone()
    }

    #[must_use]
    pub fn status(&self) -> ChartStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<ChartStatus> {
        self.status.subscribe()
    }

    /// Fetch the token once the facility is initialized.
    pub fn on_init(self: &Arc<Self>, readiness: &Readiness) -> JoinHandle<()> {
        let chart = Arc::clone(self);
        readiness.execute_when_initialized(move || async move {
            if let Err(e) = chart.initialize_token().await {
                tracing::warn!(error = %e, "Chart initialization did not complete");
            }
        })
    }

    /// Obtain a token for the TSI resource, then re-run the input gate.
    ///
    /// A cached token is used as is. Otherwise a single acquisition request is
    /// made, with no retry and no timeout beyond the provider's own.
    ///
    /// # Errors
    ///
    /// Returns the acquisition error, in which case the gate stays closed, or
    /// the gate's own error.
    pub async fn initialize_token(self: &Arc<Self>) -> AppResult<()> {
        let resource = &self.settings.token_resource;

        let token = match self.tokens.cached_token(resource) {
            Some(token) => {
                tracing::debug!(resource = %resource, "Using cached TSI token");
                token
            }
            None => {
                tracing::info!(resource = %resource, "Acquiring TSI token");
                self.status.send_replace(ChartStatus::AwaitingToken);
                match self.tokens.acquire_token(resource).await {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::error!(error = %e, resource = %resource, "TSI token acquisition failed");
                        self.status.send_replace(ChartStatus::Failed {
                            generation: None,
                            message: e.to_string(),
                        });
                        return Err(e);
                    }
                }
            }
        };

        *self.token.write().await = Some(token);
        self.token_retrieved.store(true, Ordering::SeqCst);
        tracing::info!("TSI token retrieved");

        self.try_update_chart().await.map(|_| ())
    }

    /// Replace all three inputs, then re-run the input gate.
    ///
    /// # Errors
    ///
    /// See [`evaluate_gate`].
    pub async fn set_inputs(self: &Arc<Self>, inputs: SensorInputs) -> AppResult<Option<RenderTask>> {
        *self.inputs.write().await = inputs;
        self.try_update_chart().await
    }

    /// Apply the lists present in `changes`, then re-run the input gate.
    ///
    /// # Errors
    ///
    /// See [`evaluate_gate`].
    pub async fn apply_changes(
        self: &Arc<Self>,
        changes: SensorInputChanges,
    ) -> AppResult<Option<RenderTask>> {
        {
            let mut inputs = self.inputs.write().await;
            if let Some(ids) = changes.motion_sensor_ids {
                inputs.motion_sensor_ids = Some(ids);
            }
            if let Some(ids) = changes.light_sensor_ids {
                inputs.light_sensor_ids = Some(ids);
            }
            if let Some(ids) = changes.temp_sensor_ids {
                inputs.temp_sensor_ids = Some(ids);
            }
        }
        self.try_update_chart().await
    }

    /// Input gate: start a render if the token and all three lists are present.
    ///
    /// Returns the render task when one was started, `None` when the gate
    /// stayed closed.
    ///
    /// # Errors
    ///
    /// See [`evaluate_gate`].
    pub async fn try_update_chart(self: &Arc<Self>) -> AppResult<Option<RenderTask>> {
        let inputs = self.inputs.read().await.clone();

        let open = evaluate_gate(self.is_token_retrieved(), &inputs)
            .inspect_err(|e| tracing::warn!(error = %e, "Chart input gate faulted"))?;
        if !open {
            tracing::debug!("Chart inputs incomplete, not rendering");
            return Ok(None);
        }

        tracing::info!(
            motion = inputs.motion_sensor_ids.as_ref().map_or(0, Vec::len),
            light = inputs.light_sensor_ids.as_ref().map_or(0, Vec::len),
            temp = inputs.temp_sensor_ids.as_ref().map_or(0, Vec::len),
            "Sensor ids loaded, rendering chart"
        );

        let chart = Arc::clone(self);
        Ok(Some(tokio::spawn(async move {
            chart.render_with(inputs).await
        })))
    }

    /// Rebuild and render the chart from the current inputs.
    ///
    /// # Errors
    ///
    /// Returns the first failure of target lookup, query, transform or render.
    pub async fn initialize_chart(&self) -> AppResult<()> {
        let inputs = self.inputs.read().await.clone();
        self.render_with(inputs).await
    }

    async fn render_with(&self, inputs: SensorInputs) -> AppResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(ChartStatus::Loading { generation });

        match self.build_and_render(&inputs).await {
            Ok(()) => {
                self.status.send_replace(ChartStatus::Rendered {
                    generation,
                    rendered_at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, generation, "Chart render failed");
                self.status.send_replace(ChartStatus::Failed {
                    generation: Some(generation),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The token to query with: the provider's cached entry while it is still
    /// valid, otherwise one fresh acquisition.
    async fn current_token(&self) -> AppResult<String> {
        if self.token.read().await.is_none() {
            return Err(AppError::ServiceUnavailable("No TSI token held".to_string()));
        }

        let resource = &self.settings.token_resource;
        if let Some(token) = self.tokens.cached_token(resource) {
            return Ok(token);
        }

        tracing::info!(resource = %resource, "TSI token expired, acquiring a new one");
        let token = self.tokens.acquire_token(resource).await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn build_and_render(&self, inputs: &SensorInputs) -> AppResult<()> {
        let line_chart = self.sdk.create_line_chart(&self.settings.target)?;

        let window = TimeWindow::lookback((self.clock)(), self.settings.lookback_days)?;

        let expressions: Vec<_> = SensorCategory::ALL
            .into_iter()
            .map(|category| {
                let ids = inputs.ids(category).unwrap_or_default();
                self.sdk.build_aggregate_expression(
                    category,
                    build_predicate_string(ids),
                    window,
                )
            })
            .collect();

        let token = self.current_token().await?;

        tracing::debug!(
            from = %window.from_iso(),
            to = %window.to_iso(),
            expressions = expressions.len(),
            "Fetching aggregates"
        );

        let raw = self
            .sdk
            .fetch_aggregates(&token, &self.settings.endpoint, &expressions)
            .await?;
        let data = self.sdk.transform_for_visualization(&raw, &expressions)?;

        line_chart.render(data, &RenderOptions::compact(), &expressions)
    }
}
