//! Coordinator and the operator-facing API surface built on top of it.

pub mod coordinator;
pub mod events;

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

pub use coordinator::Coordinator;
pub use events::ObserverEvent;

use crate::dispatcher::Dispatcher;
use crate::model::{RemediationLog, Stats, StoredError};
use crate::poller::LogSource;
use crate::rules::{test_pattern, PatternError, RuleEngine, RuleSummary};
use crate::store::{ErrorFilter, Page, Pagination, Store};

/// Read/control surface handed to operator-facing callers (CLI, HTTP
/// handlers, admin tooling) without exposing the coordinator's poll loop.
pub struct OperatorApi {
    store: Arc<Store>,
    rule_engine: Arc<RuleEngine>,
    dispatcher: Arc<Dispatcher>,
    observers: broadcast::Sender<ObserverEvent>,
}

impl OperatorApi {
    pub fn new<S: LogSource + 'static>(coordinator: &Coordinator<S>) -> Self {
        Self {
            store: coordinator.store(),
            rule_engine: coordinator.rule_engine(),
            dispatcher: coordinator.dispatcher(),
            observers: coordinator.observers(),
        }
    }

    pub async fn enable_remediation(&self) {
        self.dispatcher.set_enabled(true).await;
    }

    pub async fn disable_remediation(&self) {
        self.dispatcher.set_enabled(false).await;
    }

    pub async fn set_dry_run(&self, dry_run: bool) {
        self.dispatcher.set_dry_run(dry_run).await;
    }

    pub fn list_errors(&self, filter: &ErrorFilter, pagination: Pagination) -> Page<StoredError> {
        self.store.list_errors(filter, pagination)
    }

    pub fn get_error(&self, id: Uuid) -> Option<StoredError> {
        self.store.get_error(id)
    }

    pub fn list_remediation_logs(&self, pagination: Pagination) -> Page<RemediationLog> {
        self.store.list_remediation_logs(pagination)
    }

    pub fn list_remediation_logs_for_error(&self, error_id: Uuid) -> Vec<RemediationLog> {
        self.store.list_remediation_logs_for_error(error_id)
    }

    pub fn list_rules(&self) -> Vec<RuleSummary> {
        self.rule_engine.list_rules()
    }

    pub fn test_pattern(&self, pattern: &str, sample: &str) -> Result<bool, PatternError> {
        test_pattern(pattern, sample)
    }

    pub fn stats(&self) -> Stats {
        self.store.stats()
    }

    pub async fn clear_cooldown(&self, rule_name: &str, target_key: &str) {
        self.dispatcher.clear_cooldown(rule_name, target_key).await;
    }

    pub async fn clear_all_cooldowns(&self) {
        self.dispatcher.clear_all_cooldowns().await;
    }

    pub async fn actions_this_hour(&self) -> usize {
        self.dispatcher.actions_this_hour().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObserverEvent> {
        self.observers.subscribe()
    }
}
