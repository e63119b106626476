//! Configuration for the extraction client
//!
//! Defaults come from `nutrivision.toml`; environment variables override them.

use crate::error::{ClientResult, ExtractionError};
use nutrivision_core::config::{ExtractionConfig, DEFAULT_ENDPOINT_URL};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default transport timeout
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local extraction service
    Development,
    /// Hosted extraction service
    #[default]
    Production,
}

impl Environment {
    /// Parse from `NUTRIVISION_ENV`
    pub fn from_env() -> Self {
        Self::parse(&env::var("NUTRIVISION_ENV").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full URL of the extraction endpoint
    pub endpoint_url: String,
    /// Transport timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `NUTRIVISION_ENDPOINT_URL`: extraction endpoint
    /// - `NUTRIVISION_TIMEOUT_SECS`: transport timeout in seconds
    /// - `NUTRIVISION_ENV`: environment (development/production)
    pub fn from_env() -> ClientResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Build from the `[extraction]` section of `nutrivision.toml`, then apply
    /// environment overrides.
    pub fn from_schema(section: &ExtractionConfig) -> ClientResult<Self> {
        Self::default()
            .with_endpoint_url(&section.endpoint_url)
            .with_timeout(Duration::from_secs(section.timeout_secs))
            .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> ClientResult<Self> {
        self.environment = Environment::from_env();

        if let Ok(url) = env::var("NUTRIVISION_ENDPOINT_URL") {
            self.endpoint_url = url;
        }

        if let Ok(secs) = env::var("NUTRIVISION_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ExtractionError::config(format!("NUTRIVISION_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            self.timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }

    /// Configuration for a service running on this machine
    #[must_use]
    pub fn development() -> Self {
        Self {
            endpoint_url: "http://localhost:8000/extract/".to_string(),
            timeout: Duration::from_secs(10),
            environment: Environment::Development,
        }
    }

    /// Builder-style method to set the endpoint URL
    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.endpoint_url.is_empty() {
            return Err(ExtractionError::config("endpoint_url cannot be empty"));
        }

        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://") {
            return Err(ExtractionError::config(
                "endpoint_url must start with http:// or https://",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ExtractionError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}
