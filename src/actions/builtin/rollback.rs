//! `rollback` — restore a deployment's previous revision.

use std::collections::HashMap;
use std::pin::Pin;

use crate::actions::{Action, ActionContext, ActionError, Target};
use crate::cluster::resolve_deployment;

pub struct RollbackAction;

impl Action for RollbackAction {
    fn name(&self) -> &'static str {
        "rollback"
    }

    fn validate(&self, _params: &HashMap<String, String>) -> Result<(), ActionError> {
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ActionContext<'a>,
        target: &'a Target,
        _params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>> {
        Box::pin(async move {
            let name = if !target.deployment.is_empty() {
                target.deployment.clone()
            } else if !target.pod.is_empty() {
                resolve_deployment(ctx.cluster, &target.namespace, &target.pod).await?
            } else {
                return Err(ActionError::MissingTarget("deployment or pod"));
            };
            ctx.cluster.rollback_deployment(&target.namespace, &name).await?;
            Ok(())
        })
    }
}
