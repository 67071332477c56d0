//! Access tokens for the Time Series Insights resource.

pub mod aad;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, TokenSource};
use crate::error::AppResult;

pub use aad::AadTokenProvider;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A still-valid token for `resource`, if one is already held.
    fn cached_token(&self, resource: &str) -> Option<String>;

    /// Request a fresh token for `resource`.
    async fn acquire_token(&self, resource: &str) -> AppResult<String>;
}

/// Serves a pre-issued bearer token for every resource.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn cached_token(&self, _resource: &str) -> Option<String> {
        Some(self.token.clone())
    }

    async fn acquire_token(&self, _resource: &str) -> AppResult<String> {
        Ok(self.token.clone())
    }
}

/// Build the provider selected by configuration.
///
/// # Errors
///
/// Returns `AppError::Internal` if the token endpoint client cannot be built.
pub fn from_config(config: &Config) -> AppResult<Arc<dyn TokenProvider>> {
    match &config.token_source {
        TokenSource::Static(token) => {
            tracing::info!("Using static TSI bearer token");
            Ok(Arc::new(StaticTokenProvider::new(token.clone())))
        }
        TokenSource::ClientCredentials { tenant, .. } => {
            tracing::info!(tenant = %tenant, "Using Azure AD client credentials");
            Ok(Arc::new(AadTokenProvider::new(config)?))
        }
    }
}
