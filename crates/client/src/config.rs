//! Engine configuration: defaults, environment overrides, builders.

use std::time::Duration;

use thiserror::Error;

pub const ENV_API_URL: &str = "LODGE_API_URL";
pub const ENV_AUTH_TOKEN: &str = "LODGE_AUTH_TOKEN";
pub const ENV_RETRY_LIMIT: &str = "LODGE_LOAD_RETRY_LIMIT";
pub const ENV_RETRY_DELAY_MS: &str = "LODGE_LOAD_RETRY_DELAY_MS";
pub const ENV_SECONDARY_DELAY_MS: &str = "LODGE_SECONDARY_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "LODGE_REQUEST_TIMEOUT_MS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Automatic retries of the primary fetch stop once this many
    /// consecutive failures have been recorded.
    pub retry_limit: u32,
    /// Fixed delay before an automatic retry.
    pub retry_delay: Duration,
    /// Delay between the primary fetch and the secondary wave.
    pub secondary_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            token: None,
            retry_limit: 3,
            retry_delay: Duration::from_millis(3000),
            secondary_delay: Duration::from_millis(300),
            request_timeout: Duration::from_millis(15_000),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `LODGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`ClientConfig::from_env`] but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Empty(ENV_API_URL));
            }
            config = config.with_api_url(url);
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|t| !t.trim().is_empty()) {
            config = config.with_token(token.trim());
        }
        if let Some(limit) = parse_number(&lookup, ENV_RETRY_LIMIT)? {
            config.retry_limit = u32::try_from(limit).map_err(|_| ConfigError::InvalidNumber {
                var: ENV_RETRY_LIMIT,
                value: limit.to_string(),
            })?;
        }
        if let Some(ms) = parse_number(&lookup, ENV_RETRY_DELAY_MS)? {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number(&lookup, ENV_SECONDARY_DELAY_MS)? {
            config.secondary_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number(&lookup, ENV_REQUEST_TIMEOUT_MS)? {
            config.request_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_secondary_delay(mut self, delay: Duration) -> Self {
        self.secondary_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}
