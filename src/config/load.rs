//! Load — config loading from file and environment variables.
//!
//! Priority: environment variables > config file > built-in defaults.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::model::EngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(String, std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(String, toml::de::Error),
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("store.{0} must be greater than zero")]
    ZeroCap(&'static str),
    #[error("log_source.base_url must not be empty")]
    EmptyBaseUrl,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("ERRSENTRY_CONFIG_FILE").unwrap_or_else(|_| "/etc/errsentry/engine.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!(path = %config_path, "loading configuration from file");
            Self::from_file(&config_path)?
        } else {
            tracing::info!("config file not found, starting from built-in defaults");
            Self::default()
        };

        if let Ok(url) = std::env::var("ERRSENTRY_LOG_SOURCE_URL") {
            config.log_source.base_url = url;
        }
        if let Ok(tenant) = std::env::var("ERRSENTRY_LOG_SOURCE_TENANT") {
            config.log_source.tenant = Some(tenant);
        }
        if let Ok(interval) = std::env::var("ERRSENTRY_POLL_INTERVAL_SECS") {
            if let Ok(parsed) = interval.parse() {
                config.poll.interval_secs = parsed;
            }
        }
        if let Ok(dedup) = std::env::var("ERRSENTRY_DEDUP_WINDOW_SECS") {
            if let Ok(parsed) = dedup.parse() {
                config.poll.dedup_window_secs = parsed;
            }
        }
        if let Ok(max_errors) = std::env::var("ERRSENTRY_STORE_MAX_ERRORS") {
            if let Ok(parsed) = max_errors.parse() {
                config.store.max_errors = parsed;
            }
        }
        if let Ok(rules_path) = std::env::var("ERRSENTRY_RULES_PATH") {
            config.rules_path = Some(rules_path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_string(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_string(), e))
    }

    /// Absence of `rules_path` is not fatal; it just starts with an empty
    /// rule set (everything falls through to the default rule).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_source.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("poll.interval_secs"));
        }
        if self.poll.dedup_window_secs == 0 {
            return Err(ConfigError::ZeroInterval("poll.dedup_window_secs"));
        }
        if self.poll.sweep_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("poll.sweep_interval_secs"));
        }
        if self.store.max_errors == 0 {
            return Err(ConfigError::ZeroCap("max_errors"));
        }
        if self.store.max_logs == 0 {
            return Err(ConfigError::ZeroCap("max_logs"));
        }
        if self.dispatcher.enabled && self.dispatcher.max_actions_per_hour == 0 {
            return Err(ConfigError::ZeroCap("dispatcher.max_actions_per_hour"));
        }
        Ok(())
    }
}
