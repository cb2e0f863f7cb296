//! Configuration: `EngineConfig` loaded from TOML with env overrides.

pub mod load;
pub mod model;

pub use load::ConfigError;
pub use model::{DispatcherConfig, EngineConfig, LogSourceConfig, PollConfig, StoreConfig};
