//! Startup configuration for the API gateway.
//!
//! Sources, later ones winning: `.env` (loaded into the process environment),
//! an optional `signdesk.toml`, then `SIGNDESK__*` environment variables.
//! The endpoint is resolved once here instead of probing the runtime later.

use std::time::Duration;

use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::retry::RetryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid api url: {0:?}")]
    InvalidUrl(String),
}

/// Where the client runs. Server-side rendering cannot route to the public
/// hostname, so it talks to the internal address when one is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    #[default]
    Browser,
    Server,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub internal_api_url: Option<String>,
    #[serde(default)]
    pub context: ExecutionContext,
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_read_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    100
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            internal_api_url: None,
            context: ExecutionContext::default(),
            read_retries: default_read_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("signdesk").required(false))
            .add_source(Environment::with_prefix("SIGNDESK").separator("__"))
            .build()?;

        let config: ApiConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for url in std::iter::once(&self.api_url).chain(self.internal_api_url.as_ref()) {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }

    /// The base URL requests are sent to in the configured context.
    pub fn base_url(&self) -> &str {
        match (self.context, &self.internal_api_url) {
            (ExecutionContext::Server, Some(internal)) => internal,
            _ => &self.api_url,
        }
    }

    pub fn read_retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.read_retries,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000/api");
        assert_eq!(config.read_retry().max_retries, 2);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn server_context_prefers_internal_url() {
        let config = ApiConfig {
            internal_api_url: Some("http://backend:8000/api".to_string()),
            context: ExecutionContext::Server,
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://backend:8000/api");
    }

    #[test]
    fn browser_context_ignores_internal_url() {
        let config = ApiConfig {
            internal_api_url: Some("http://backend:8000/api".to_string()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn server_context_without_internal_url_falls_back() {
        let config = ApiConfig {
            context: ExecutionContext::Server,
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn deserializes_from_config_sources() {
        let config: ApiConfig = Cfg::builder()
            .set_override("api_url", "https://sign.example.com/api")
            .unwrap()
            .set_override("context", "server")
            .unwrap()
            .set_override("read_retries", 0)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.context, ExecutionContext::Server);
        assert_eq!(config.base_url(), "https://sign.example.com/api");
        assert_eq!(config.read_retry().max_retries, 0);
        assert_eq!(config.retry_backoff_ms, 100);
    }

    #[test]
    fn rejects_non_http_url() {
        let config = ApiConfig {
            api_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));
    }
}
