//! `delete-stuck-pods` — force-delete pods that have a deletion timestamp
//! set but are still reported as running.

use std::collections::HashMap;
use std::pin::Pin;

use crate::actions::{Action, ActionContext, ActionError, Target};
use crate::cluster::Propagation;

pub struct DeleteStuckPodsAction;

impl Action for DeleteStuckPodsAction {
    fn name(&self) -> &'static str {
        "delete-stuck-pods"
    }

    fn validate(&self, _params: &HashMap<String, String>) -> Result<(), ActionError> {
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ActionContext<'a>,
        target: &'a Target,
        params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>> {
        Box::pin(async move {
            if target.namespace.is_empty() {
                return Err(ActionError::MissingTarget("namespace"));
            }
            let pod_filter = params.get("pod_filter").map(String::as_str);

            let pods = ctx.cluster.list_pods(&target.namespace, None).await?;
            for pod in pods {
                if let Some(filter) = pod_filter {
                    if !pod.name.contains(filter) {
                        continue;
                    }
                }
                let stuck = pod.deletion_timestamp.is_some() && pod.phase == "Running";
                if stuck {
                    ctx.cluster
                        .delete_pod(&target.namespace, &pod.name, 0, Propagation::Background)
                        .await?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{FakeCluster, PodRef};

    #[tokio::test]
    async fn deletes_only_stuck_pods() {
        let cluster = FakeCluster::new();
        cluster
            .add_pod(PodRef {
                namespace: "prod".into(),
                name: "stuck-1".into(),
                phase: "Running".into(),
                deletion_timestamp: Some("2024-01-01T00:00:00Z".into()),
                owner_replica_set: None,
            })
            .await;
        cluster
            .add_pod(PodRef {
                namespace: "prod".into(),
                name: "healthy-1".into(),
                phase: "Running".into(),
                deletion_timestamp: None,
                owner_replica_set: None,
            })
            .await;

        let ctx = ActionContext { cluster: &cluster };
        let target = Target { namespace: "prod".into(), ..Default::default() };
        let action = DeleteStuckPodsAction;
        action.execute(&ctx, &target, &HashMap::new()).await.unwrap();

        assert!(cluster.get_pod("prod", "stuck-1").await.is_err());
        assert!(cluster.get_pod("prod", "healthy-1").await.is_ok());
    }
}
