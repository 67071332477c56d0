use std::env;

/// Longest lookback window accepted from `TSI_HOW_MANY_DAYS`.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

/// Where access tokens for the TSI resource come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Pre-issued bearer token, never refreshed.
    Static(String),
    /// OAuth2 client-credentials grant against an Azure AD tenant.
    ClientCredentials {
        authority_host: String,
        tenant: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    // Time Series Insights
    pub tsi_fqdn: String,
    pub tsi_api_resource: String,
    pub tsi_how_many_days: i64,
    pub tsi_api_version: String,

    // Authentication
    pub token_source: TokenSource,
    pub token_cache_ttl_seconds: u64,

    // Chart
    pub chart_target: String,

    // HTTP client
    pub http_timeout_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// `ConfigError::Invalid` if the lookback window is not between 1 and
    /// [`MAX_LOOKBACK_DAYS`] days.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let tsi_how_many_days = parse_lookback_days(
            &env::var("TSI_HOW_MANY_DAYS").unwrap_or_else(|_| "30".to_string()),
        )?;

        Ok(Self {
            // Time Series Insights
            tsi_fqdn: env::var("TSI_FQDN").map_err(|_| ConfigError::Missing("TSI_FQDN"))?,
            tsi_api_resource: env::var("TSI_API")
                .unwrap_or_else(|_| "https://api.timeseries.azure.com/".to_string()),
            tsi_how_many_days,
            tsi_api_version: env::var("TSI_API_VERSION")
                .unwrap_or_else(|_| "2016-12-12".to_string()),

            // Authentication
            token_source: token_source_from_env()?,
            token_cache_ttl_seconds: env::var("TOKEN_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000), // tokens are issued for an hour

            // Chart
            chart_target: env::var("CHART_TARGET").unwrap_or_else(|_| "tsichart".to_string()),

            // HTTP client
            http_timeout_seconds: env::var("HTTP_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parse_lookback_days(raw: &str) -> Result<i64, ConfigError> {
    let days: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid("TSI_HOW_MANY_DAYS"))?;
    if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(ConfigError::Invalid("TSI_HOW_MANY_DAYS"));
    }
    Ok(days)
}

fn token_source_from_env() -> Result<TokenSource, ConfigError> {
    if let Ok(token) = env::var("TSI_BEARER_TOKEN")
        && !token.is_empty()
    {
        return Ok(TokenSource::Static(token));
    }

    Ok(TokenSource::ClientCredentials {
        authority_host: env::var("AAD_AUTHORITY_HOST")
            .unwrap_or_else(|_| "https://login.microsoftonline.com".to_string()),
        tenant: env::var("AAD_TENANT").map_err(|_| ConfigError::Missing("AAD_TENANT"))?,
        client_id: env::var("AAD_CLIENT_ID").map_err(|_| ConfigError::Missing("AAD_CLIENT_ID"))?,
        client_secret: env::var("AAD_CLIENT_SECRET")
            .map_err(|_| ConfigError::Missing("AAD_CLIENT_SECRET"))?,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
