//! Fake log source — test double for [`super::loki::LogSource`].

use std::pin::Pin;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::model::LogEntry;

use super::loki::{LogSource, TransportError};

/// Replays a fixed batch of log entries on the first `query_range` call,
/// then returns empty on subsequent calls — enough to drive a single poll
/// cycle deterministically in tests.
pub struct FakeLogSource {
    remaining: Mutex<Vec<LogEntry>>,
}

impl FakeLogSource {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { remaining: Mutex::new(entries) }
    }
}

impl LogSource for FakeLogSource {
    fn query_range<'a>(
        &'a self,
        _query: &'a str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _limit: u32,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<LogEntry>, TransportError>> + Send + 'a>> {
        Box::pin(async move {
            let mut remaining = self.remaining.lock().await;
            Ok(std::mem::take(&mut *remaining))
        })
    }

    fn ready<'a>(&'a self) -> Pin<Box<dyn std::future::Future<Output = bool> + Send + 'a>> {
        Box::pin(async { true })
    }
}
