//! Aggregate query descriptors.
//!
//! An [`AggregateExpression`] describes one chart series: which sensors
//! contribute (predicate), what is measured, how it is bucketed over time, and
//! how the series is styled. Descriptors are rebuilt on every render.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Width of every time bucket in the chart.
pub const BUCKET_SIZE_MINUTES: i64 = 30;

/// The three sensor families plotted on the facility chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SensorCategory {
    Motion,
    Light,
    Temperature,
}

impl SensorCategory {
    /// Render order of the series.
    pub const ALL: [Self; 3] = [Self::Motion, Self::Light, Self::Temperature];

    #[must_use]
    pub fn measure_property(self) -> &'static str {
        match self {
            Self::Motion => "Occupied",
            Self::Light => "Light",
            Self::Temperature => "Temperature",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Motion => "#60B9AE",
            Self::Light => "Green",
            Self::Temperature => "Red",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Motion => "Occupied",
            Self::Light => "Light",
            Self::Temperature => "Temperature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Avg,
}

impl AggregationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "avg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum MeasureKind {
    Double,
}

/// Event property an aggregate is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Measure {
    pub property: String,
    #[serde(rename = "type")]
    pub kind: MeasureKind,
}

impl Measure {
    #[must_use]
    pub fn double(property: &str) -> Self {
        Self {
            property: property.to_string(),
            kind: MeasureKind::Double,
        }
    }
}

/// Time range of a query together with its bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub bucket_size: Duration,
}

impl TimeWindow {
    /// Trailing window `[now - days, now]` with 30-minute buckets.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the window start falls outside the
    /// representable date range.
    pub fn lookback(now: DateTime<Utc>, days: i64) -> AppResult<Self> {
        let from = Duration::try_days(days)
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| {
                AppError::BadRequest(format!("Lookback of {days} days is out of range"))
            })?;

        Ok(Self {
            from,
            to: now,
            bucket_size: Duration::minutes(BUCKET_SIZE_MINUTES),
        })
    }

    #[must_use]
    pub fn from_iso(&self) -> String {
        iso8601(self.from)
    }

    #[must_use]
    pub fn to_iso(&self) -> String {
        iso8601(self.to)
    }

    /// Bucket width in TSI notation (`30m`, `1h`, `45s`).
    #[must_use]
    pub fn bucket_size_label(&self) -> String {
        let secs = self.bucket_size.num_seconds();
        if secs > 0 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs > 0 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        }
    }
}

fn iso8601(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpression {
    pub predicate: String,
    pub measure: Measure,
    pub measure_types: Vec<AggregationType>,
    pub search_span: TimeWindow,
    pub color: String,
    pub display_name: String,
}

impl AggregateExpression {
    #[must_use]
    pub fn new(
        predicate: String,
        measure: Measure,
        measure_types: Vec<AggregationType>,
        search_span: TimeWindow,
        color: &str,
        display_name: &str,
    ) -> Self {
        Self {
            predicate,
            measure,
            measure_types,
            search_span,
            color: color.to_string(),
            display_name: display_name.to_string(),
        }
    }

    /// Average of the category's measure over `window`, unsplit.
    #[must_use]
    pub fn for_category(category: SensorCategory, predicate: String, window: TimeWindow) -> Self {
        Self::new(
            predicate,
            Measure::double(category.measure_property()),
            vec![AggregationType::Avg],
            window,
            category.color(),
            category.display_name(),
        )
    }

    /// Query body for the TSI `aggregates` endpoint: a single date histogram,
    /// not split by any property.
    #[must_use]
    pub fn to_tsx(&self) -> Value {
        let measures: Vec<Value> = self
            .measure_types
            .iter()
            .map(|t| {
                let mut measure = Map::new();
                measure.insert(
                    t.as_str().to_string(),
                    json!({
                        "input": {
                            "property": self.measure.property,
                            "type": self.measure.kind,
                        }
                    }),
                );
                Value::Object(measure)
            })
            .collect();

        let aggregate = json!({
            "dimension": {
                "dateHistogram": {
                    "input": { "builtInProperty": "$ts" },
                    "breaks": { "size": self.search_span.bucket_size_label() },
                }
            },
            "measures": measures,
        });

        json!({
            "searchSpan": {
                "from": self.search_span.from_iso(),
                "to": self.search_span.to_iso(),
            },
            "predicate": { "predicateString": self.predicate },
            "aggregates": [aggregate],
        })
    }
}
