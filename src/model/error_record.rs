//! Transient and stored error records, and the remediation ledger entry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::rule::Priority;

/// Raw label + content pulled from the log source for one line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub labels: HashMap<String, String>,
    pub raw_line: String,
}

/// A decoded, fingerprinted error produced by the poller.
/// Exists only between poll decode and the store write.
#[derive(Debug, Clone)]
pub struct ParsedError {
    pub id: Uuid,
    pub fingerprint: String,
    pub timestamp: DateTime<Utc>,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub message: String,
    pub labels: HashMap<String, String>,
    pub raw_line: String,
}

/// A [`ParsedError`] after rule matching.
#[derive(Debug, Clone)]
pub struct MatchedError {
    pub error: ParsedError,
    pub priority: Priority,
    pub rule_name: String,
    pub count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub remediated: bool,
}

impl MatchedError {
    pub fn new(error: ParsedError, priority: Priority, rule_name: String) -> Self {
        let ts = error.timestamp;
        Self {
            error,
            priority,
            rule_name,
            count: 1,
            first_seen: ts,
            last_seen: ts,
            remediated: false,
        }
    }
}

/// The aggregated projection held by the [`crate::store::Store`].
///
/// Invariants: `count >= 1`, `first_seen <= last_seen`, `remediated_at.is_some() == remediated`.
#[derive(Debug, Clone)]
pub struct StoredError {
    pub id: Uuid,
    pub fingerprint: String,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub message: String,
    pub raw_line: String,
    pub labels: HashMap<String, String>,
    pub priority: Priority,
    pub rule_name: String,
    pub count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub remediated: bool,
    pub remediated_at: Option<DateTime<Utc>>,
}

impl From<MatchedError> for StoredError {
    fn from(m: MatchedError) -> Self {
        Self {
            id: m.error.id,
            fingerprint: m.error.fingerprint,
            namespace: m.error.namespace,
            pod: m.error.pod,
            container: m.error.container,
            message: m.error.message,
            raw_line: m.error.raw_line,
            labels: m.error.labels,
            priority: m.priority,
            rule_name: m.rule_name,
            count: m.count,
            first_seen: m.first_seen,
            last_seen: m.last_seen,
            remediated: m.remediated,
            remediated_at: None,
        }
    }
}

/// Outcome of a single remediation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RemediationStatus {
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RemediationLog {
    pub id: Uuid,
    pub error_id: Uuid,
    pub action: String,
    pub target: String,
    pub status: RemediationStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
}

/// Derived snapshot of store contents.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub total_errors: usize,
    pub by_priority: HashMap<String, usize>,
    pub by_namespace: HashMap<String, usize>,
    pub total_logs: usize,
    pub successful_logs: usize,
    pub failed_logs: usize,
    pub most_recent_error: Option<DateTime<Utc>>,
    pub most_recent_remediation: Option<DateTime<Utc>>,
}
