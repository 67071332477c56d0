//! Test doubles for the chart's collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use tsi_chart::auth::TokenProvider;
use tsi_chart::chart::{
    AggregateExpression, ChartSdk, ChartSettings, ChartSurface, ChartSurfaces, LineChart,
    TsiChart,
};
use tsi_chart::error::{AppError, AppResult};
use tsi_chart::tsi::models::{AggregatesResponse, RawAggregateResult};

pub const TARGET: &str = "tsichart";
pub const ENDPOINT: &str = "facility.env.timeseries.azure.com";
pub const RESOURCE: &str = "https://api.timeseries.azure.com/";

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
}

pub fn settings() -> ChartSettings {
    ChartSettings {
        endpoint: ENDPOINT.to_string(),
        token_resource: RESOURCE.to_string(),
        lookback_days: 30,
        target: TARGET.to_string(),
    }
}

pub fn ids(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(ToString::to_string).collect())
}

/// Two half-hour buckets, the second one empty.
pub fn sample_response() -> AggregatesResponse {
    serde_json::from_value(json!({
        "aggregates": [{
            "dimension": ["2026-10-19T11:00:00Z", "2026-10-19T11:30:00Z"],
            "measures": [[0.5], [null]]
        }]
    }))
    .unwrap()
}

#[derive(Debug, Clone)]
pub struct FetchCall {
    pub token: String,
    pub endpoint: String,
    pub expressions: Vec<AggregateExpression>,
}

pub struct MockSdk {
    pub surfaces: Arc<ChartSurfaces>,
    pub fetches: Mutex<Vec<FetchCall>>,
    pub fail_fetch: bool,
    /// Fetches whose motion predicate matches wait here until released
    pub holds: Vec<(String, Arc<Notify>)>,
}

impl MockSdk {
    pub fn new() -> Self {
        let surfaces = Arc::new(ChartSurfaces::new());
        surfaces.register(TARGET);
        Self {
            surfaces,
            fetches: Mutex::new(Vec::new()),
            fail_fetch: false,
            holds: Vec::new(),
        }
    }

    pub fn without_target() -> Self {
        Self {
            surfaces: Arc::new(ChartSurfaces::new()),
            fetches: Mutex::new(Vec::new()),
            fail_fetch: false,
            holds: Vec::new(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_fetch: true,
            ..Self::new()
        }
    }

    /// Fetches for the given motion predicates block until [`MockSdk::release`].
    pub fn holding(motion_predicates: &[&str]) -> Self {
        Self {
            holds: motion_predicates
                .iter()
                .map(|p| (p.to_string(), Arc::new(Notify::new())))
                .collect(),
            ..Self::new()
        }
    }

    pub fn release(&self, motion_predicate: &str) {
        let (_, hold) = self
            .holds
            .iter()
            .find(|(p, _)| p == motion_predicate)
            .expect("predicate is held");
        hold.notify_one();
    }

    pub fn surface(&self) -> Arc<ChartSurface> {
        self.surfaces.register(TARGET)
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartSdk for MockSdk {
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
        self.fetches.lock().unwrap().push(FetchCall {
            token: token.to_string(),
            endpoint: endpoint.to_string(),
            expressions: expressions.to_vec(),
        });

        let hold = self
            .holds
            .iter()
            .find(|(p, _)| expressions.first().is_some_and(|e| &e.predicate == p))
            .map(|(_, hold)| Arc::clone(hold));
        if let Some(hold) = hold {
            hold.notified().await;
        }

        if self.fail_fetch {
            return Err(AppError::TsiApi("HTTP 400 Bad Request: syntax error".to_string()));
        }

        Ok(expressions.iter().map(|_| sample_response()).collect())
    }
}

pub enum Acquire {
    Token(&'static str),
    Fail,
    Never,
}

/// Token provider whose cache can be expired by the test.
pub struct MockTokens {
    pub cache: Mutex<Option<String>>,
    pub acquire: Acquire,
    pub acquire_calls: AtomicUsize,
}

impl MockTokens {
    pub fn cached(token: &'static str) -> Self {
        Self {
            cache: Mutex::new(Some(token.to_string())),
            acquire: Acquire::Fail,
            acquire_calls: AtomicUsize::new(0),
        }
    }

    pub fn acquiring(acquire: Acquire) -> Self {
        Self {
            cache: Mutex::new(None),
            acquire,
            acquire_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Drop the cached entry, as a TTL eviction would.
    pub fn expire(&self) {
        self.cache.lock().unwrap().take();
    }
}

#[async_trait]
impl TokenProvider for MockTokens {
    fn cached_token(&self, _resource: &str) -> Option<String> {
        self.cache.lock().unwrap().clone()
    }

    async fn acquire_token(&self, _resource: &str) -> AppResult<String> {
        let call = self.acquire_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.acquire {
            Acquire::Token(token) => {
                let token = format!("{token}-{call}");
                *self.cache.lock().unwrap() = Some(token.clone());
                Ok(token)
            }
            Acquire::Fail => Err(AppError::TokenAcquisition(
                "HTTP 401: invalid_client".to_string(),
            )),
            Acquire::Never => std::future::pending::<AppResult<String>>().await,
        }
    }
}

pub fn chart(sdk: Arc<MockSdk>, tokens: Arc<MockTokens>) -> Arc<TsiChart> {
    chart_with(settings(), sdk, tokens)
}

pub fn chart_with(
    settings: ChartSettings,
    sdk: Arc<MockSdk>,
    tokens: Arc<MockTokens>,
) -> Arc<TsiChart> {
    Arc::new(TsiChart::new(settings, sdk, tokens).with_clock(Arc::new(fixed_now)))
}
