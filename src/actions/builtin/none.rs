//! The reserved no-op action. Always succeeds without touching the cluster.

use std::collections::HashMap;
use std::pin::Pin;

use crate::actions::{Action, ActionContext, ActionError, Target, NONE_ACTION};

pub struct NoneAction;

impl Action for NoneAction {
    fn name(&self) -> &'static str {
        NONE_ACTION
    }

    fn validate(&self, _params: &HashMap<String, String>) -> Result<(), ActionError> {
        Ok(())
    }

    fn execute<'a>(
        &'a self,
        _ctx: &'a ActionContext<'a>,
        _target: &'a Target,
        _params: &'a HashMap<String, String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ActionError>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}
