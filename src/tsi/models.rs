use serde::{Deserialize, Serialize};

/// Response from `POST /aggregates` for a single query expression.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatesResponse {
    #[serde(default)]
    pub aggregates: Vec<AggregateNode>,
    /// Non-fatal query warnings reported by the service
    #[serde(default)]
    pub warnings: Vec<serde_json::Value>,
}

/// One level of an aggregate tree.
///
/// For a date histogram, `dimension` holds ISO-8601 bucket starts and
/// `measures[i]` holds one value per requested aggregation for bucket `i`.
/// Split queries nest a further level under `aggregate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateNode {
    #[serde(default)]
    pub dimension: Vec<serde_json::Value>,
    #[serde(default)]
    pub measures: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub aggregate: Option<serde_json::Value>,
}

/// Raw batch result: one response per submitted expression, in submission order.
pub type RawAggregateResult = Vec<AggregatesResponse>;
