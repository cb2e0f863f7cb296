//! Action registry — named, pluggable remediation actions.

pub mod builtin;
pub mod target;

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::cluster::ClusterCapability;
pub use target::Target;

/// The reserved no-op action name. Rules with no remediation configured
/// default to this.
pub const NONE_ACTION: &str = "none";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("invalid parameters for action '{0}': {1}")]
    InvalidParams(String, String),
    #[error("missing required target field: {0}")]
    MissingTarget(&'static str),
    #[error("cluster error: {0}")]
    Cluster(#[from] crate::cluster::ClusterError),
}

/// Everything an action needs to act: the cluster capability it talks to.
pub struct ActionContext<'a> {
    pub cluster: &'a dyn ClusterCapability,
}

/// A named remediation action. Object-safe via `Pin<Box<…>>` returns so it
/// can live behind a `dyn Action`.
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, params: &HashMap<String, String>) -> Result<(), ActionError>;

    fn execute<'a>(
        &'a self,
        ctx: &'a ActionContext<'a>,
        target: &'a Target,
        params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>>;
}

/// Name → action map. Registration is idempotent: the last registration
/// for a given name wins.
pub struct ActionRegistry {
    actions: RwLock<HashMap<&'static str, Arc<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self { actions: RwLock::new(HashMap::new()) }
    }

    /// The registry pre-populated with the built-in action set.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(builtin::none::NoneAction));
        registry.register(Arc::new(builtin::restart_pod::RestartPodAction));
        registry.register(Arc::new(builtin::scale::ScaleUpAction));
        registry.register(Arc::new(builtin::scale::ScaleDownAction));
        registry.register(Arc::new(builtin::rollback::RollbackAction));
        registry.register(Arc::new(builtin::delete_stuck_pods::DeleteStuckPodsAction));
        registry
    }

    pub fn register(&self, action: Arc<dyn Action>) {
        let mut actions = self.actions.write().unwrap();
        actions.insert(action.name(), action);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.read().unwrap().contains_key(name)
    }

    pub fn validate(&self, name: &str, params: &HashMap<String, String>) -> Result<(), ActionError> {
        let actions = self.actions.read().unwrap();
        let action = actions.get(name).ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        action.validate(params)
    }

    pub async fn execute(
        &self,
        name: &str,
        ctx: &ActionContext<'_>,
        target: &Target,
        params: &HashMap<String, String>,
    ) -> Result<(), ActionError> {
        let action = {
            let actions = self.actions.read().unwrap();
            actions
                .get(name)
                .cloned()
                .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?
        };
        action.execute(ctx, target, params).await
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_action_is_registered() {
        let registry = ActionRegistry::with_builtins();
        assert!(registry.contains(NONE_ACTION));
        assert!(registry.contains("restart-pod"));
        assert!(registry.contains("scale-up"));
        assert!(registry.contains("scale-down"));
        assert!(registry.contains("rollback"));
        assert!(registry.contains("delete-stuck-pods"));
    }

    #[test]
    fn registration_is_idempotent_last_wins() {
        let registry = ActionRegistry::new();
        registry.register(Arc::new(builtin::none::NoneAction));
        registry.register(Arc::new(builtin::none::NoneAction));
        assert_eq!(registry.actions.read().unwrap().len(), 1);
    }

    #[test]
    fn unknown_action_rejected() {
        let registry = ActionRegistry::new();
        assert!(registry.validate("bogus", &HashMap::new()).is_err());
    }
}
