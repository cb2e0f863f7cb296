//! Remediation dispatcher — ordered safety gates, then action execution.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::actions::{ActionContext, ActionRegistry, Target};
use crate::cluster::ClusterCapability;
use crate::model::rule::RemediationSpec;
use crate::model::{MatchedError, RemediationLog, RemediationStatus};

struct Inner {
    enabled: bool,
    dry_run: bool,
    max_actions_per_hour: usize,
    excluded_namespaces: Vec<String>,
    cooldowns: HashMap<String, DateTime<Utc>>,
    recent_actions: VecDeque<DateTime<Utc>>,
}

/// Safety-gated action dispatcher. A single mutex guards every gate
/// check and mutation so concurrent callers observe one consistent order.
pub struct Dispatcher {
    inner: Mutex<Inner>,
    registry: ActionRegistry,
}

impl Dispatcher {
    pub fn new(enabled: bool, dry_run: bool, max_actions_per_hour: usize, excluded_namespaces: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                enabled,
                dry_run,
                max_actions_per_hour,
                excluded_namespaces,
                cooldowns: HashMap::new(),
                recent_actions: VecDeque::new(),
            }),
            registry: ActionRegistry::with_builtins(),
        }
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.inner.lock().await.enabled = enabled;
    }

    pub async fn set_dry_run(&self, dry_run: bool) {
        self.inner.lock().await.dry_run = dry_run;
    }

    pub async fn clear_cooldown(&self, rule_name: &str, target_key: &str) {
        let mut inner = self.inner.lock().await;
        inner.cooldowns.remove(&cooldown_key(rule_name, target_key));
    }

    pub async fn clear_all_cooldowns(&self) {
        self.inner.lock().await.cooldowns.clear();
    }

    pub async fn actions_this_hour(&self) -> usize {
        let mut inner = self.inner.lock().await;
        purge_stale_actions(&mut inner.recent_actions);
        inner.recent_actions.len()
    }

    /// Run the matched error's remediation (if any) through the safety
    /// gates, execute the action, and return the log describing what
    /// happened. Every path — including skips — produces a log.
    pub async fn execute(
        &self,
        matched: &MatchedError,
        rule_name: &str,
        remediation: Option<&RemediationSpec>,
        target: &Target,
        cluster: &dyn ClusterCapability,
    ) -> (RemediationLog, Option<crate::actions::ActionError>) {
        let target_key = target.as_key();
        let mut inner = self.inner.lock().await;

        macro_rules! skip {
            ($msg:expr) => {
                return (
                    self.make_log(matched.error.id, "?", &target_key, RemediationStatus::Skipped, $msg, false),
                    None,
                )
            };
        }

        if !inner.enabled {
            skip!("remediation disabled".to_string());
        }

        let Some(remediation) = remediation else {
            skip!("no remediation action configured".to_string());
        };
        if remediation.is_none() {
            skip!("no remediation action configured".to_string());
        }

        if inner.excluded_namespaces.iter().any(|ns| ns == &matched.error.namespace) {
            skip!(format!("namespace '{}' is excluded from remediation", matched.error.namespace));
        }

        let key = cooldown_key(rule_name, &target_key);
        if let Some(expiry) = inner.cooldowns.get(&key).copied() {
            let now = Utc::now();
            if now < expiry {
                skip!(format!("cooldown active until {}", expiry.to_rfc3339()));
            }
        }

        purge_stale_actions(&mut inner.recent_actions);
        if inner.recent_actions.len() >= inner.max_actions_per_hour {
            skip!(format!("hourly limit reached ({} actions)", inner.max_actions_per_hour));
        }

        if !self.registry.contains(&remediation.action) {
            let log = self.make_log(
                matched.error.id,
                &remediation.action,
                &target_key,
                RemediationStatus::Failed,
                format!("unknown action: {}", remediation.action),
                false,
            );
            return (log, None);
        }

        if let Err(e) = self.registry.validate(&remediation.action, &remediation.params) {
            let log = self.make_log(
                matched.error.id,
                &remediation.action,
                &target_key,
                RemediationStatus::Failed,
                format!("invalid parameters: {e}"),
                false,
            );
            return (log, Some(e));
        }

        if inner.dry_run {
            let log = self.make_log(
                matched.error.id,
                &remediation.action,
                &target_key,
                RemediationStatus::Success,
                "dry run - would execute action".to_string(),
                true,
            );
            return (log, None);
        }

        let ctx = ActionContext { cluster };
        let result = self.registry.execute(&remediation.action, &ctx, target, &remediation.params).await;

        match result {
            Ok(()) => {
                inner.cooldowns.insert(key, Utc::now() + ChronoDuration::from_std(remediation.cooldown).unwrap());
                inner.recent_actions.push_back(Utc::now());
                let log = self.make_log(
                    matched.error.id,
                    &remediation.action,
                    &target_key,
                    RemediationStatus::Success,
                    "action executed".to_string(),
                    false,
                );
                (log, None)
            }
            Err(e) => {
                // Action failures don't set cooldown: the dispatcher retries
                // on the next matching error.
                let log = self.make_log(
                    matched.error.id,
                    &remediation.action,
                    &target_key,
                    RemediationStatus::Failed,
                    format!("{e}"),
                    false,
                );
                (log, Some(e))
            }
        }
    }

    fn make_log(
        &self,
        error_id: Uuid,
        action: &str,
        target: &str,
        status: RemediationStatus,
        message: String,
        dry_run: bool,
    ) -> RemediationLog {
        RemediationLog {
            id: Uuid::new_v4(),
            error_id,
            action: action.to_string(),
            target: target.to_string(),
            status,
            message,
            timestamp: Utc::now(),
            dry_run,
        }
    }
}

fn cooldown_key(rule_name: &str, target_key: &str) -> String {
    format!("{rule_name}:{target_key}")
}

fn purge_stale_actions(recent: &mut VecDeque<DateTime<Utc>>) {
    let cutoff = Utc::now() - ChronoDuration::hours(1);
    while let Some(front) = recent.front() {
        if *front < cutoff {
            recent.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::FakeCluster;
    use crate::model::rule::Priority;
    use crate::model::ParsedError;
    use std::time::Duration;

    fn remediation(action: &str, cooldown: Duration) -> RemediationSpec {
        RemediationSpec { action: action.to_string(), params: HashMap::new(), cooldown }
    }

    fn matched_error(namespace: &str, pod: &str) -> MatchedError {
        MatchedError::new(
            ParsedError {
                id: Uuid::new_v4(),
                fingerprint: "fp".to_string(),
                timestamp: Utc::now(),
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                container: "app".to_string(),
                message: "boom".to_string(),
                labels: HashMap::new(),
                raw_line: "boom".to_string(),
            },
            Priority::P1,
            "r".to_string(),
        )
    }

    #[tokio::test]
    async fn dry_run_does_not_invoke_cluster() {
        let dispatcher = Dispatcher::new(true, true, 10, vec![]);
        let cluster = FakeCluster::new();
        let matched = matched_error("prod", "web-1");
        let spec = remediation("restart-pod", Duration::from_secs(300));
        let target = Target::for_pod("prod", "web-1", "app");

        let (log, err) = dispatcher.execute(&matched, "r", Some(&spec), &target, &cluster).await;
        assert!(err.is_none());
        assert_eq!(log.status, RemediationStatus::Success);
        assert!(log.dry_run);
        assert!(cluster.deleted_pods().await.is_empty());
    }

    #[tokio::test]
    async fn cooldown_skips_second_call_within_window() {
        let dispatcher = Dispatcher::new(true, false, 10, vec![]);
        let cluster = FakeCluster::new();
        cluster
            .add_pod(crate::cluster::PodRef {
                namespace: "prod".into(),
                name: "web-1".into(),
                phase: "Running".into(),
                deletion_timestamp: None,
                owner_replica_set: None,
            })
            .await;
        let matched = matched_error("prod", "web-1");
        let spec = remediation("restart-pod", Duration::from_secs(300));
        let target = Target::for_pod("prod", "web-1", "app");

        let (first, _) = dispatcher.execute(&matched, "r", Some(&spec), &target, &cluster).await;
        assert_eq!(first.status, RemediationStatus::Success);

        let (second, _) = dispatcher.execute(&matched, "r", Some(&spec), &target, &cluster).await;
        assert_eq!(second.status, RemediationStatus::Skipped);
        assert!(second.message.contains("cooldown"));
    }

    #[tokio::test]
    async fn hourly_cap_skips_third_action() {
        let dispatcher = Dispatcher::new(true, false, 2, vec![]);
        let cluster = FakeCluster::new();
        for name in ["a", "b", "c"] {
            cluster
                .add_pod(crate::cluster::PodRef {
                    namespace: "prod".into(),
                    name: name.into(),
                    phase: "Running".into(),
                    deletion_timestamp: None,
                    owner_replica_set: None,
                })
                .await;
        }

        let mut statuses = vec![];
        for name in ["a", "b", "c"] {
            let matched = matched_error("prod", name);
            let spec = remediation("restart-pod", Duration::from_secs(1));
            let target = Target::for_pod("prod", name, "app");
            let rule_name = format!("rule-{name}");
            let (log, _) = dispatcher.execute(&matched, &rule_name, Some(&spec), &target, &cluster).await;
            statuses.push(log.status);
        }

        assert_eq!(statuses[0], RemediationStatus::Success);
        assert_eq!(statuses[1], RemediationStatus::Success);
        assert_eq!(statuses[2], RemediationStatus::Skipped);
    }

    #[tokio::test]
    async fn excluded_namespace_always_skips() {
        let dispatcher = Dispatcher::new(true, false, 10, vec!["kube-system".to_string()]);
        let cluster = FakeCluster::new();
        let matched = matched_error("kube-system", "web-1");
        let spec = remediation("restart-pod", Duration::from_secs(300));
        let target = Target::for_pod("kube-system", "web-1", "app");

        let (log, _) = dispatcher.execute(&matched, "r", Some(&spec), &target, &cluster).await;
        assert_eq!(log.status, RemediationStatus::Skipped);
        assert!(log.message.contains("excluded"));
    }

    #[tokio::test]
    async fn disabled_dispatcher_skips_before_any_other_gate() {
        let dispatcher = Dispatcher::new(false, false, 10, vec![]);
        let cluster = FakeCluster::new();
        let matched = matched_error("prod", "web-1");
        let spec = remediation("restart-pod", Duration::from_secs(300));
        let target = Target::for_pod("prod", "web-1", "app");

        let (log, _) = dispatcher.execute(&matched, "r", Some(&spec), &target, &cluster).await;
        assert_eq!(log.status, RemediationStatus::Skipped);
        assert_eq!(log.message, "remediation disabled");
    }
}
