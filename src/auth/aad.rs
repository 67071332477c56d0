use async_trait::async_trait;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::config::{Config, TokenSource};
use crate::error::{AppError, AppResult};

/// Response from `{authority}/oauth2/token`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Azure AD client-credentials provider.
///
/// Tokens are cached per resource for the configured TTL, which should stay
/// below the token lifetime issued by the tenant.
pub struct AadTokenProvider {
    http_client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cache: Cache<String, String>,
}

impl AadTokenProvider {
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the configuration does not describe client
    /// credentials or the HTTP client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let TokenSource::ClientCredentials {
            authority_host,
            tenant,
            client_id,
            client_secret,
        } = &config.token_source
        else {
            return Err(AppError::Internal(
                "AAD provider requires client credentials".to_string(),
            ));
        };

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            token_url: token_url(authority_host, tenant),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            cache: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(config.token_cache_ttl_seconds))
                .build(),
        })
    }
}

#[async_trait]
impl TokenProvider for AadTokenProvider {
    fn cached_token(&self, resource: &str) -> Option<String> {
        self.cache.get(resource)
    }

    async fn acquire_token(&self, resource: &str) -> AppResult<String> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("resource", resource),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::TokenAcquisition(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::TokenAcquisition(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::TokenAcquisition(format!("Failed to parse response: {e}")))?;

        tracing::info!(
            resource = %resource,
            token_type = ?token.token_type,
            "TSI token retrieved"
        );

        self.cache
            .insert(resource.to_string(), token.access_token.clone());
        Ok(token.access_token)
    }
}

fn token_url(authority_host: &str, tenant: &str) -> String {
    format!("{}/{}/oauth2/token", authority_host.trim_end_matches('/'), tenant)
}
