//! Incremental log poller: query, parse, fingerprint, dedupe, dispatch.

pub mod dedup;
pub mod fake;
pub mod loki;
pub mod runner;

pub use dedup::DedupWindow;
pub use fake::FakeLogSource;
pub use loki::{LogSource, LokiClient, TransportError};
pub use runner::{Handler, Poller, PollerConfig, PollerMetrics};
