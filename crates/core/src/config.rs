//! Configuration loading for the gateway and CLI.

use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Identity of the remote cache service.
///
/// All three values are opaque strings supplied externally; the only
/// validation is non-emptiness, surfaced as a configuration error before
/// the first request.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub cache_id: String,
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
}

impl RemoteConfig {
    /// Check that host, cache id, and api key are all present.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::configuration("remote cache host is not set"));
        }
        if self.cache_id.trim().is_empty() {
            return Err(Error::configuration("remote cache id is not set"));
        }
        match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => Ok(()),
            _ => Err(Error::configuration("remote cache api key is not set")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Mandatory per-request timeout.
    pub timeout_ms: u64,
    /// Automatic retries for idempotent operations on transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 2,
            retry_base_delay_ms: 200,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Allow an explicit search override to drop below the category's
    /// configured threshold. Default is to clamp to the floor.
    pub allow_override_below_floor: bool,
    /// Optional YAML file replacing the builtin block rules.
    pub rules_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub json_logs: bool,
}

impl AppConfig {
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map CACHEWARDEN__REMOTE__HOST to remote.host
            .add_source(Environment::with_prefix("CACHEWARDEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_remote_config_fails_validation() {
        let remote = RemoteConfig::default();
        assert!(matches!(remote.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn complete_remote_config_passes_validation() {
        let remote = RemoteConfig {
            host: "https://cache.example.net".into(),
            cache_id: "prod-1".into(),
            api_key: Some(Secret::new("key-123".into())),
        };
        assert!(remote.validate().is_ok());
    }

    #[test]
    fn whitespace_api_key_fails_validation() {
        let remote = RemoteConfig {
            host: "https://cache.example.net".into(),
            cache_id: "prod-1".into(),
            api_key: Some(Secret::new("   ".into())),
        };
        assert!(matches!(remote.validate(), Err(Error::Configuration(_))));
    }
}
