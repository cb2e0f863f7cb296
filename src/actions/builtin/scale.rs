//! `scale-up` / `scale-down` — patch a deployment's replica count.

use std::collections::HashMap;
use std::pin::Pin;

use crate::actions::{Action, ActionContext, ActionError, Target};
use crate::cluster::resolve_deployment;

use super::resolve_replicas;

async fn deployment_name(ctx: &ActionContext<'_>, target: &Target) -> Result<String, ActionError> {
    if !target.deployment.is_empty() {
        return Ok(target.deployment.clone());
    }
    if target.pod.is_empty() {
        return Err(ActionError::MissingTarget("deployment or pod"));
    }
    Ok(resolve_deployment(ctx.cluster, &target.namespace, &target.pod).await?)
}

fn parse_bound(params: &HashMap<String, String>, key: &str) -> Result<Option<i32>, ActionError> {
    match params.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ActionError::InvalidParams(key.to_string(), format!("not an integer: {raw}"))),
    }
}

pub struct ScaleUpAction;

impl Action for ScaleUpAction {
    fn name(&self) -> &'static str {
        "scale-up"
    }

    fn validate(&self, params: &HashMap<String, String>) -> Result<(), ActionError> {
        if !params.contains_key("replicas") {
            return Err(ActionError::InvalidParams("scale-up".into(), "missing 'replicas'".into()));
        }
        parse_bound(params, "max_replicas")?;
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ActionContext<'a>,
        target: &'a Target,
        params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>> {
        Box::pin(async move {
            let name = deployment_name(ctx, target).await?;
            let deployment = ctx.cluster.get_deployment(&target.namespace, &name).await?;

            let raw = params
                .get("replicas")
                .ok_or_else(|| ActionError::InvalidParams("scale-up".into(), "missing 'replicas'".into()))?;
            let desired = resolve_replicas(deployment.replicas, raw)
                .ok_or_else(|| ActionError::InvalidParams("replicas".into(), format!("unparseable: '{raw}'")))?;

            if let Some(max) = parse_bound(params, "max_replicas")? {
                if desired > max {
                    return Err(ActionError::InvalidParams(
                        "max_replicas".into(),
                        format!("desired replicas {desired} exceeds max {max}"),
                    ));
                }
            }

            ctx.cluster.patch_deployment_replicas(&target.namespace, &name, desired).await?;
            Ok(())
        })
    }
}

pub struct ScaleDownAction;

impl Action for ScaleDownAction {
    fn name(&self) -> &'static str {
        "scale-down"
    }

    fn validate(&self, params: &HashMap<String, String>) -> Result<(), ActionError> {
        if !params.contains_key("replicas") {
            return Err(ActionError::InvalidParams("scale-down".into(), "missing 'replicas'".into()));
        }
        parse_bound(params, "min_replicas")?;
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a ActionContext<'a>,
        target: &'a Target,
        params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>> {
        Box::pin(async move {
            let name = deployment_name(ctx, target).await?;
            let deployment = ctx.cluster.get_deployment(&target.namespace, &name).await?;

            let raw = params
                .get("replicas")
                .ok_or_else(|| ActionError::InvalidParams("scale-down".into(), "missing 'replicas'".into()))?;
            let mut desired = resolve_replicas(deployment.replicas, raw)
                .ok_or_else(|| ActionError::InvalidParams("replicas".into(), format!("unparseable: '{raw}'")))?;

            let min = parse_bound(params, "min_replicas")?.unwrap_or(0);
            if desired < min {
                desired = min;
            }

            ctx.cluster.patch_deployment_replicas(&target.namespace, &name, desired).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_up_requires_replicas_param() {
        let action = ScaleUpAction;
        assert!(action.validate(&HashMap::new()).is_err());
    }

    #[test]
    fn scale_down_floors_at_min() {
        let mut params = HashMap::new();
        params.insert("replicas".to_string(), "-10".to_string());
        params.insert("min_replicas".to_string(), "1".to_string());
        let action = ScaleDownAction;
        assert!(action.validate(&params).is_ok());
    }
}
