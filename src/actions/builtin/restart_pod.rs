//! `restart-pod` — force-delete the target pod with grace period 0.

use std::collections::HashMap;
use std::pin::Pin;

use crate::actions::{Action, ActionContext, ActionError, Target};
use crate::cluster::Propagation;

pub struct RestartPodAction;

impl Action for RestartPodAction {
    fn name(&self) -> &'static str {
        "restart-pod"
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
            if target.pod.is_empty() {
                return Err(ActionError::MissingTarget("pod"));
            }
            ctx.cluster
                .delete_pod(&target.namespace, &target.pod, 0, Propagation::Background)
                .await?;
            Ok(())
        })
    }
}
