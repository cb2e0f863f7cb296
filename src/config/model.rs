//! EngineConfig — the serde-deserializable configuration surface.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_source: LogSourceConfig,
    pub poll: PollConfig,
    pub store: StoreConfig,
    pub dispatcher: DispatcherConfig,
    pub rules_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSourceConfig {
    pub base_url: String,
    pub tenant: Option<String>,
    pub basic_auth_user: Option<String>,
    pub basic_auth_password: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub query: String,
    pub interval_secs: u64,
    pub lookback_secs: u64,
    pub dedup_window_secs: u64,
    pub sweep_interval_secs: u64,
    pub query_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_errors: usize,
    pub max_logs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub dry_run: bool,
    pub max_actions_per_hour: usize,
    pub excluded_namespaces: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_source: LogSourceConfig::default(),
            poll: PollConfig::default(),
            store: StoreConfig::default(),
            dispatcher: DispatcherConfig::default(),
            rules_path: None,
        }
    }
}

impl Default for LogSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3100".to_string(),
            tenant: None,
            basic_auth_user: None,
            basic_auth_password: None,
            timeout_secs: 30,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            interval_secs: 15,
            lookback_secs: 5 * 60,
            dedup_window_secs: 30 * 60,
            sweep_interval_secs: 5 * 60,
            query_limit: 1000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_errors: 10_000, max_logs: 5_000 }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { enabled: true, dry_run: false, max_actions_per_hour: 10, excluded_namespaces: Vec::new() }
    }
}
