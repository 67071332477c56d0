use futures::future::try_join_all;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::tsi::models::{AggregatesResponse, RawAggregateResult};

pub struct TsiClient {
    http_client: Client,
    api_version: String,
}

impl TsiClient {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_version: config.tsi_api_version.clone(),
        })
    }

    /// Run a batch of aggregate queries against an environment.
    ///
    /// Queries are sent concurrently, one request each; the result keeps
    /// submission order. The first failure fails the whole batch.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TsiApi` if any request fails or returns an error status.
    pub async fn get_aggregates(
        &self,
        token: &str,
        fqdn: &str,
        queries: &[serde_json::Value],
    ) -> AppResult<RawAggregateResult> {
        let url = aggregates_url(fqdn, &self.api_version);

        tracing::debug!(url = %url, queries = queries.len(), "Submitting aggregate queries");

        try_join_all(
            queries
                .iter()
                .map(|query| self.post_aggregates(&url, token, query)),
        )
        .await
    }

    async fn post_aggregates(
        &self,
        url: &str,
        token: &str,
        query: &serde_json::Value,
    ) -> AppResult<AggregatesResponse> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(query)
            .send()
            .await
            .map_err(|e| AppError::TsiApi(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::TsiApi("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::TsiApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::TsiApi(format!("Failed to get response text: {e}")))?;

        let parsed: AggregatesResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse aggregates response"
            );
            AppError::TsiApi(format!("Failed to parse response: {e}"))
        })?;

        if !parsed.warnings.is_empty() {
            tracing::warn!(warnings = ?parsed.warnings, "Aggregate query returned warnings");
        }

        Ok(parsed)
    }
}

/// Endpoint for aggregate queries. A bare FQDN is served over HTTPS.
#[must_use]
pub fn aggregates_url(fqdn: &str, api_version: &str) -> String {
    let base = if fqdn.starts_with("http://") || fqdn.starts_with("https://") {
        fqdn.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", fqdn.trim_end_matches('/'))
    };
    format!("{base}/aggregates?api-version={api_version}")
}
