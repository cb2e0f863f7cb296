//! Poll loop — incremental range queries, parse, fingerprint, dedup,
//! and handler dispatch, with cooperative cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::model::{LogEntry, ParsedError};
use crate::normalize::{extract_message, fingerprint};

use super::dedup::DedupWindow;
use super::loki::LogSource;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub query: String,
    pub poll_interval: Duration,
    pub lookback: Duration,
    pub dedup_window: Duration,
    pub sweep_interval: Duration,
    pub query_limit: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            poll_interval: Duration::from_secs(15),
            lookback: Duration::from_secs(5 * 60),
            dedup_window: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            query_limit: 1000,
        }
    }
}

/// Cheap atomic counters updated on the poll-loop hot path.
#[derive(Default)]
pub struct PollerMetrics {
    pub lines_polled: AtomicU64,
    pub parse_failures: AtomicU64,
    pub dedup_hits: AtomicU64,
    pub poll_failures: AtomicU64,
}

pub type Handler = std::sync::Arc<
    dyn Fn(Vec<ParsedError>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

pub struct Poller<S: LogSource> {
    log_source: S,
    config: PollerConfig,
    dedup: DedupWindow,
    last_poll_end: RwLock<Option<DateTime<Utc>>>,
    pub metrics: PollerMetrics,
}

impl<S: LogSource> Poller<S> {
    pub fn new(log_source: S, config: PollerConfig) -> Self {
        let dedup = DedupWindow::new(config.dedup_window);
        Self { log_source, config, dedup, last_poll_end: RwLock::new(None), metrics: PollerMetrics::default() }
    }

    /// Run the poll loop until `shutdown` fires. An initial poll runs
    /// immediately; subsequent polls follow `poll_interval`. A background
    /// sweep of the dedup window runs on `sweep_interval`.
    pub async fn run(&self, handler: Handler, mut shutdown: watch::Receiver<bool>) {
        let mut poll_ticker = time::interval(self.config.poll_interval);
        poll_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep_ticker = time::interval(self.config.sweep_interval);
        sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.poll_once(&handler).await;

        loop {
            tokio::select! {
                _ = poll_ticker.tick() => {
                    self.poll_once(&handler).await;
                }
                _ = sweep_ticker.tick() => {
                    let evicted = self.dedup.sweep(Utc::now());
                    if evicted > 0 {
                        info!(evicted, "dedup window sweep evicted stale fingerprints");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("poller received shutdown signal, stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn poll_once(&self, handler: &Handler) {
        let now = Utc::now();
        let lookback_start = now - chrono::Duration::from_std(self.config.lookback).unwrap();
        let start = {
            let last = *self.last_poll_end.read().unwrap();
            match last {
                Some(last) if last > lookback_start => last,
                _ => lookback_start,
            }
        };

        let result = self
            .log_source
            .query_range(&self.config.query, start, now, self.config.query_limit)
            .await;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                self.metrics.poll_failures.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "log source query failed, will retry next tick");
                return;
            }
        };

        *self.last_poll_end.write().unwrap() = Some(now);
        self.metrics.lines_polled.fetch_add(entries.len() as u64, Ordering::Relaxed);

        let mut batch = Vec::new();
        for entry in entries {
            match self.decode(entry) {
                Some(parsed) => {
                    if self.dedup.observe(&parsed.fingerprint, parsed.timestamp) {
                        batch.push(parsed);
                    } else {
                        self.metrics.dedup_hits.fetch_add(1, Ordering::Relaxed);
                    }
                }
                None => {
                    self.metrics.parse_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if batch.is_empty() {
            return;
        }

        // Handler exceptions must not terminate the loop: run it on its
        // own task and await the join so a panic surfaces as a `JoinError`
        // instead of unwinding through the poll loop. The poller still
        // makes no further progress until the handler returns, since we
        // await the handle immediately.
        let invocation = handler(batch);
        match tokio::spawn(invocation).await {
            Ok(()) => {}
            Err(join_err) if join_err.is_panic() => {
                error!("poll handler panicked, continuing");
            }
            Err(join_err) => {
                warn!(error = %join_err, "poll handler task was cancelled");
            }
        }
    }

    fn decode(&self, entry: LogEntry) -> Option<ParsedError> {
        let namespace = entry.labels.get("namespace").cloned().unwrap_or_default();
        let pod = entry.labels.get("pod").cloned().unwrap_or_default();
        let container = entry.labels.get("container").cloned().unwrap_or_default();
        if namespace.is_empty() {
            return None;
        }

        let message = extract_message(&entry.raw_line);
        let fp = fingerprint(&namespace, &pod, &container, &message);

        Some(ParsedError {
            id: Uuid::new_v4(),
            fingerprint: fp,
            timestamp: entry.timestamp,
            namespace,
            pod,
            container,
            message,
            labels: entry.labels,
            raw_line: entry.raw_line,
        })
    }

    pub fn dedup_len(&self) -> usize {
        self.dedup.len()
    }
}
