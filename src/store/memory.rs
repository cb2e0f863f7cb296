//! In-memory aggregating store — fingerprint → StoredError, plus the
//! remediation log ledger. A single RwLock protects both indices.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{MatchedError, RemediationLog, Stats, StoredError};

use super::filter::{ErrorFilter, Page, Pagination};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error not found: {0}")]
    ErrorNotFound(Uuid),
}

struct Inner {
    errors_by_id: HashMap<Uuid, StoredError>,
    id_by_fingerprint: HashMap<String, Uuid>,
    logs: Vec<RemediationLog>,
}

/// Aggregating store. `max_errors`/`max_logs` bound memory use; both
/// evict the oldest 10% when exceeded.
pub struct Store {
    inner: RwLock<Inner>,
    max_errors: usize,
    max_logs: usize,
}

impl Store {
    pub fn new(max_errors: usize, max_logs: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                errors_by_id: HashMap::new(),
                id_by_fingerprint: HashMap::new(),
                logs: Vec::new(),
            }),
            max_errors,
            max_logs,
        }
    }

    /// Insert a newly matched error, or fold it into the existing entry
    /// sharing its fingerprint.
    pub fn save_error(&self, matched: MatchedError) {
        let mut inner = self.inner.write().unwrap();
        let fingerprint = matched.error.fingerprint.clone();

        if let Some(existing_id) = inner.id_by_fingerprint.get(&fingerprint).copied() {
            if let Some(existing) = inner.errors_by_id.get_mut(&existing_id) {
                existing.count += 1;
                existing.last_seen = existing.last_seen.max(matched.error.timestamp);
                existing.first_seen = existing.first_seen.min(matched.error.timestamp);
                return;
            }
        }

        let stored: StoredError = matched.into();
        let id = stored.id;
        inner.id_by_fingerprint.insert(fingerprint, id);
        inner.errors_by_id.insert(id, stored);

        if inner.errors_by_id.len() > self.max_errors {
            evict_oldest_errors(&mut inner, self.max_errors);
        }
    }

    pub fn get_error(&self, id: Uuid) -> Option<StoredError> {
        self.inner.read().unwrap().errors_by_id.get(&id).cloned()
    }

    pub fn get_error_by_fingerprint(&self, fingerprint: &str) -> Option<StoredError> {
        let inner = self.inner.read().unwrap();
        let id = inner.id_by_fingerprint.get(fingerprint)?;
        inner.errors_by_id.get(id).cloned()
    }

    pub fn list_errors(&self, filter: &ErrorFilter, pagination: Pagination) -> Page<StoredError> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<StoredError> = inner
            .errors_by_id
            .values()
            .filter(|e| matches_filter(e, filter))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            a.priority
                .weight()
                .cmp(&b.priority.weight())
                .then_with(|| b.last_seen.cmp(&a.last_seen))
        });

        let total = matched.len();
        let items = matched.into_iter().skip(pagination.offset).take(pagination.limit).collect();
        Page { items, total }
    }

    pub fn update_error(&self, updated: StoredError) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.errors_by_id.contains_key(&updated.id) {
            return Err(StoreError::ErrorNotFound(updated.id));
        }
        inner.errors_by_id.insert(updated.id, updated);
        Ok(())
    }

    pub fn delete_old_errors(&self, before: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write().unwrap();
        let stale: Vec<Uuid> = inner
            .errors_by_id
            .values()
            .filter(|e| e.last_seen < before)
            .map(|e| e.id)
            .collect();
        for id in &stale {
            if let Some(e) = inner.errors_by_id.remove(id) {
                inner.id_by_fingerprint.remove(&e.fingerprint);
            }
        }
        stale.len()
    }

    pub fn save_remediation_log(&self, log: RemediationLog) {
        let mut inner = self.inner.write().unwrap();
        inner.logs.push(log);
        if inner.logs.len() > self.max_logs {
            evict_oldest_logs(&mut inner.logs, self.max_logs);
        }
    }

    pub fn list_remediation_logs_for_error(&self, error_id: Uuid) -> Vec<RemediationLog> {
        let inner = self.inner.read().unwrap();
        let mut logs: Vec<RemediationLog> = inner.logs.iter().filter(|l| l.error_id == error_id).cloned().collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs
    }

    pub fn list_remediation_logs(&self, pagination: Pagination) -> Page<RemediationLog> {
        let inner = self.inner.read().unwrap();
        let mut logs: Vec<RemediationLog> = inner.logs.clone();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let total = logs.len();
        let items = logs.into_iter().skip(pagination.offset).take(pagination.limit).collect();
        Page { items, total }
    }

    pub fn stats(&self) -> Stats {
        let inner = self.inner.read().unwrap();
        let mut stats = Stats { total_errors: inner.errors_by_id.len(), ..Default::default() };

        for e in inner.errors_by_id.values() {
            *stats.by_priority.entry(format!("{:?}", e.priority)).or_insert(0) += 1;
            *stats.by_namespace.entry(e.namespace.clone()).or_insert(0) += 1;
            stats.most_recent_error = Some(stats.most_recent_error.map_or(e.last_seen, |t| t.max(e.last_seen)));
        }

        stats.total_logs = inner.logs.len();
        for log in &inner.logs {
            match log.status {
                crate::model::RemediationStatus::Success => stats.successful_logs += 1,
                crate::model::RemediationStatus::Failed => stats.failed_logs += 1,
                crate::model::RemediationStatus::Skipped => {}
            }
            stats.most_recent_remediation =
                Some(stats.most_recent_remediation.map_or(log.timestamp, |t| t.max(log.timestamp)));
        }

        stats
    }
}

fn matches_filter(e: &StoredError, filter: &ErrorFilter) -> bool {
    if let Some(ns) = &filter.namespace {
        if &e.namespace != ns {
            return false;
        }
    }
    if let Some(pod) = &filter.pod_contains {
        if !e.pod.contains(pod.as_str()) {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if e.priority != priority {
            return false;
        }
    }
    if let Some(remediated) = filter.remediated {
        if e.remediated != remediated {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if e.last_seen < since {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let search = search.to_lowercase();
        let haystack = format!("{} {} {}", e.message, e.pod, e.namespace).to_lowercase();
        if !haystack.contains(&search) {
            return false;
        }
    }
    true
}

/// Evict the oldest 10% of errors by `last_seen`, keeping the functional
/// fingerprint↔id mapping intact.
fn evict_oldest_errors(inner: &mut Inner, cap: usize) {
    let evict_count = (cap / 10).max(1);
    let mut ids: Vec<Uuid> = inner.errors_by_id.keys().copied().collect();
    ids.sort_by_key(|id| inner.errors_by_id[id].last_seen);
    for id in ids.into_iter().take(evict_count) {
        if let Some(e) = inner.errors_by_id.remove(&id) {
            inner.id_by_fingerprint.remove(&e.fingerprint);
        }
    }
}

fn evict_oldest_logs(logs: &mut Vec<RemediationLog>, cap: usize) {
    let evict_count = (cap / 10).max(1);
    logs.sort_by_key(|l| l.timestamp);
    logs.drain(0..evict_count.min(logs.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParsedError, RemediationStatus};
    use crate::model::rule::Priority;
    use chrono::Duration as ChronoDuration;

    fn parsed(fingerprint: &str, ts: DateTime<Utc>) -> ParsedError {
        ParsedError {
            id: Uuid::new_v4(),
            fingerprint: fingerprint.to_string(),
            timestamp: ts,
            namespace: "prod".to_string(),
            pod: "web-1".to_string(),
            container: "app".to_string(),
            message: "boom".to_string(),
            labels: HashMap::new(),
            raw_line: "boom".to_string(),
        }
    }

    #[test]
    fn aggregation_counts_and_tracks_first_last_seen() {
        let store = Store::new(100, 100);
        let t0 = Utc::now();
        for i in 0..3 {
            let ts = t0 + ChronoDuration::seconds(i);
            store.save_error(MatchedError::new(parsed("fp1", ts), Priority::P1, "r".to_string()));
        }
        let stored = store.get_error_by_fingerprint("fp1").unwrap();
        assert_eq!(stored.count, 3);
        assert_eq!(stored.first_seen, t0);
        assert_eq!(stored.last_seen, t0 + ChronoDuration::seconds(2));
    }

    #[test]
    fn list_errors_sorts_by_priority_then_recency() {
        let store = Store::new(100, 100);
        let now = Utc::now();
        store.save_error(MatchedError::new(parsed("low", now), Priority::P3, "r".to_string()));
        store.save_error(MatchedError::new(
            parsed("high-old", now - ChronoDuration::minutes(5)),
            Priority::P1,
            "r".to_string(),
        ));
        store.save_error(MatchedError::new(parsed("high-new", now), Priority::P1, "r".to_string()));

        let page = store.list_errors(&ErrorFilter::default(), Pagination { offset: 0, limit: 10 });
        assert_eq!(page.items[0].fingerprint, "high-new");
        assert_eq!(page.items[1].fingerprint, "high-old");
        assert_eq!(page.items[2].fingerprint, "low");
    }

    #[test]
    fn eviction_keeps_cap_and_index_consistency() {
        let store = Store::new(10, 100);
        let now = Utc::now();
        for i in 0..15 {
            store.save_error(MatchedError::new(
                parsed(&format!("fp{i}"), now + ChronoDuration::seconds(i)),
                Priority::P4,
                "default".to_string(),
            ));
        }
        let inner = store.inner.read().unwrap();
        assert!(inner.errors_by_id.len() <= 10);
        assert_eq!(inner.errors_by_id.len(), inner.id_by_fingerprint.len());
    }

    #[test]
    fn update_error_can_flip_remediated_and_is_filterable() {
        let store = Store::new(100, 100);
        let now = Utc::now();
        store.save_error(MatchedError::new(parsed("fp1", now), Priority::P1, "r".to_string()));

        let mut stored = store.get_error_by_fingerprint("fp1").unwrap();
        assert!(!stored.remediated);
        assert!(stored.remediated_at.is_none());

        stored.remediated = true;
        stored.remediated_at = Some(now);
        store.update_error(stored).unwrap();

        let updated = store.get_error_by_fingerprint("fp1").unwrap();
        assert!(updated.remediated);
        assert_eq!(updated.remediated_at, Some(now));

        let page = store.list_errors(&ErrorFilter { remediated: Some(true), ..Default::default() }, Pagination::default());
        assert_eq!(page.items.len(), 1);
        let page = store.list_errors(&ErrorFilter { remediated: Some(false), ..Default::default() }, Pagination::default());
        assert!(page.items.is_empty());
    }

    #[test]
    fn remediation_log_listing_sorted_descending() {
        let store = Store::new(100, 100);
        let error_id = Uuid::new_v4();
        let now = Utc::now();
        for i in 0..3 {
            store.save_remediation_log(RemediationLog {
                id: Uuid::new_v4(),
                error_id,
                action: "restart-pod".to_string(),
                target: "prod/web-1".to_string(),
                status: RemediationStatus::Success,
                message: "ok".to_string(),
                timestamp: now + ChronoDuration::seconds(i),
                dry_run: false,
            });
        }
        let logs = store.list_remediation_logs_for_error(error_id);
        assert!(logs[0].timestamp > logs[1].timestamp);
    }
}
