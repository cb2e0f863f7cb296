//! End-to-end seed scenarios wired through the coordinator: poll → match →
//! aggregate → dispatch, against fake log and cluster backends.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use errsentry::cluster::{ClusterCapability, FakeCluster, PodRef};
use errsentry::coordinator::{Coordinator, OperatorApi};
use errsentry::dispatcher::Dispatcher;
use errsentry::model::{LogEntry, RemediationStatus};
use errsentry::poller::{FakeLogSource, Poller, PollerConfig};
use errsentry::rules::{parse_rule_file, RuleEngine};
use errsentry::store::{ErrorFilter, Pagination, Store};

fn entry(namespace: &str, pod: &str, line: &str) -> LogEntry {
    let mut labels = HashMap::new();
    labels.insert("namespace".to_string(), namespace.to_string());
    labels.insert("pod".to_string(), pod.to_string());
    labels.insert("container".to_string(), "app".to_string());
    LogEntry { timestamp: Utc::now(), labels, raw_line: line.to_string() }
}

const DEFAULT_RULES: &str = r#"
[[rule]]
name = "crashloop-backoff"
priority = "P1"
[rule.match]
keywords = ["CrashLoopBackOff"]

[[rule]]
name = "oom-killed"
priority = "P2"
[rule.match]
keywords = ["OOMKilled"]
"#;

async fn run_one_poll<S: errsentry::poller::LogSource + 'static>(
    log_source: S,
    rule_engine: RuleEngine,
    store: Store,
    dispatcher: Dispatcher,
    cluster: Arc<dyn ClusterCapability>,
) -> (Arc<Store>, OperatorApi) {
    let poller = Poller::new(log_source, PollerConfig::default());
    let coordinator = Coordinator::new(poller, rule_engine, store, dispatcher, cluster);

    // The initial poll runs before the shutdown signal is ever checked, so
    // signalling shutdown immediately still lets exactly one poll through.
    coordinator.shutdown();
    coordinator.run().await;

    let store = coordinator.store();
    let operator = OperatorApi::new(&coordinator);
    (store, operator)
}

#[tokio::test]
async fn s1_matches_crashloop_and_aggregates_repeat_lines() {
    let rules = parse_rule_file(DEFAULT_RULES).unwrap();
    let log_source = FakeLogSource::new(vec![
        entry("prod", "web-7d4f8b9c5d-abc12", "2024-01-01T10:00:00Z ERROR CrashLoopBackOff in container app"),
        entry("prod", "web-7d4f8b9c5d-abc12", "2024-01-01T10:00:01Z ERROR CrashLoopBackOff in container app"),
    ]);
    let cluster: Arc<dyn ClusterCapability> = Arc::new(FakeCluster::new());
    let (store, _operator) = run_one_poll(
        log_source,
        RuleEngine::new(rules),
        Store::new(100, 100),
        Dispatcher::new(true, false, 10, vec![]),
        cluster,
    )
    .await;

    let page = store.list_errors(&ErrorFilter::default(), Pagination::default());
    assert_eq!(page.items.len(), 1, "both lines should fold into one fingerprint");
    let stored = &page.items[0];
    assert_eq!(stored.rule_name, "crashloop-backoff");
    assert!(matches!(stored.priority, errsentry::model::rule::Priority::P1));
    assert_eq!(stored.count, 2);
}

#[tokio::test]
async fn s2_statefulset_replicas_share_one_entry() {
    let rules = parse_rule_file(DEFAULT_RULES).unwrap();
    let log_source = FakeLogSource::new(vec![
        entry("prod", "api-0", "2024-01-01T10:00:00Z ERROR OOMKilled in container app"),
        entry("prod", "api-1", "2024-01-01T10:00:00Z ERROR OOMKilled in container app"),
    ]);
    let cluster: Arc<dyn ClusterCapability> = Arc::new(FakeCluster::new());
    let (store, _operator) = run_one_poll(
        log_source,
        RuleEngine::new(rules),
        Store::new(100, 100),
        Dispatcher::new(true, false, 10, vec![]),
        cluster,
    )
    .await;

    let page = store.list_errors(&ErrorFilter::default(), Pagination::default());
    assert_eq!(page.items.len(), 1, "api-0 and api-1 share statefulset base 'api'");
    assert_eq!(page.items[0].count, 2);
    assert_eq!(page.items[0].rule_name, "oom-killed");
}

// Cooldown-skip behavior on a second dispatch within the window is covered
// by the dispatcher's own colocated unit tests; this exercises the
// successful first dispatch end to end through the coordinator.
#[tokio::test]
async fn s3_restart_pod_executes_successfully() {
    let rules_toml = r#"
        [[rule]]
        name = "crashloop-backoff"
        priority = "P1"
        [rule.match]
        keywords = ["CrashLoopBackOff"]
        [rule.remediation]
        action = "restart-pod"
        cooldown = "5m"
    "#;
    let rules = parse_rule_file(rules_toml).unwrap();
    let log_source = FakeLogSource::new(vec![entry(
        "prod",
        "web-7d4f8b9c5d-abc12",
        "ERROR CrashLoopBackOff in container app",
    )]);
    let cluster_impl = FakeCluster::new();
    cluster_impl
        .add_pod(PodRef {
            namespace: "prod".into(),
            name: "web-7d4f8b9c5d-abc12".into(),
            phase: "Running".into(),
            deletion_timestamp: None,
            owner_replica_set: None,
        })
        .await;
    let cluster: Arc<dyn ClusterCapability> = Arc::new(cluster_impl);

    let (store, _operator) = run_one_poll(
        log_source,
        RuleEngine::new(rules),
        Store::new(100, 100),
        Dispatcher::new(true, false, 10, vec![]),
        cluster,
    )
    .await;

    let logs = store.list_remediation_logs(Pagination::default());
    assert_eq!(logs.items.len(), 1);
    assert_eq!(logs.items[0].status, RemediationStatus::Success);
    assert!(!logs.items[0].dry_run);

    let stored = store.get_error_by_fingerprint(&store.list_errors(&ErrorFilter::default(), Pagination::default()).items[0].fingerprint).unwrap();
    assert!(stored.remediated);
    assert!(stored.remediated_at.is_some());

    let remediated_only = store.list_errors(
        &ErrorFilter { remediated: Some(true), ..Default::default() },
        Pagination::default(),
    );
    assert_eq!(remediated_only.items.len(), 1);
}

#[tokio::test]
async fn s6_test_pattern_reports_ok_and_compile_error() {
    let operator_store = Store::new(10, 10);
    let operator_dispatcher = Dispatcher::new(true, false, 10, vec![]);
    let poller = Poller::new(FakeLogSource::new(vec![]), PollerConfig::default());
    let cluster: Arc<dyn ClusterCapability> = Arc::new(FakeCluster::new());
    let coordinator =
        Coordinator::new(poller, RuleEngine::empty(), operator_store, operator_dispatcher, cluster);
    let operator = OperatorApi::new(&coordinator);

    assert!(operator.test_pattern("OOM.*", "OOMKilled").unwrap());
    assert!(operator.test_pattern("[", "x").is_err());
}
