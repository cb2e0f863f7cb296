//! Deduplication window — bounded-memory "have we seen this fingerprint
//! recently" tracking, backed by an RwLock map swept periodically.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub struct DedupWindow {
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
    window: Duration,
}

impl DedupWindow {
    pub fn new(window: Duration) -> Self {
        Self { seen: RwLock::new(HashMap::new()), window }
    }

    /// Returns `true` and records the observation if `fingerprint` is new
    /// within the current window; returns `false` without mutation otherwise.
    pub fn observe(&self, fingerprint: &str, at: DateTime<Utc>) -> bool {
        let mut seen = self.seen.write().unwrap();
        if seen.contains_key(fingerprint) {
            return false;
        }
        seen.insert(fingerprint.to_string(), at);
        true
    }

    /// Drop entries older than the window. Called by the background sweep.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::from_std(self.window).unwrap();
        let mut seen = self.seen.write().unwrap();
        let before = seen.len();
        seen.retain(|_, first_seen| *first_seen >= cutoff);
        before - seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn first_observation_is_new() {
        let window = DedupWindow::new(Duration::from_secs(1800));
        assert!(window.observe("fp1", Utc::now()));
    }

    #[test]
    fn repeat_observation_within_window_is_not_new() {
        let window = DedupWindow::new(Duration::from_secs(1800));
        let now = Utc::now();
        assert!(window.observe("fp1", now));
        assert!(!window.observe("fp1", now + ChronoDuration::minutes(5)));
    }

    #[test]
    fn sweep_evicts_stale_entries_only() {
        let window = DedupWindow::new(Duration::from_secs(1800));
        let now = Utc::now();
        window.observe("stale", now - ChronoDuration::minutes(40));
        window.observe("fresh", now - ChronoDuration::minutes(5));

        let evicted = window.sweep(now);
        assert_eq!(evicted, 1);
        assert_eq!(window.len(), 1);
    }
}
