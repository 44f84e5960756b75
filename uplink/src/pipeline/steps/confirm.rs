//! The confirmation gate.

use crate::config::ConfirmSpec;
use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use async_trait::async_trait;
use tracing::warn;

/// The registry name consulted for message-style confirmations.
pub const PROMPT_HANDLER: &str = "prompt";

/// Asks the configured confirm handler; a `false` answer aborts the run.
pub struct ConfirmStep;

#[async_trait]
impl PipelineStep for ConfirmStep {
    fn name(&self) -> &'static str {
        "confirm"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        let handler = match ctx.config.confirm {
            None => return Ok(StepFlow::Continue),
            Some(ConfirmSpec::Handler(ref name)) => {
                let Some(handler) = services.hooks.confirm(name) else {
                    warn!(handler = %name, "confirm handler not registered; proceeding");
                    return Ok(StepFlow::Continue);
                };
                handler
            }
            Some(ConfirmSpec::Message(_)) => {
                // Message confirmations go through the embedding app's
                // prompt handler; with none registered the run proceeds.
                let Some(handler) = services.hooks.confirm(PROMPT_HANDLER) else {
                    return Ok(StepFlow::Continue);
                };
                handler
            }
        };

        if handler(ctx).await {
            Ok(StepFlow::Continue)
        } else {
            Ok(StepFlow::Abort)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::dom::Document;
    use crate::engine::Engine;
    use futures::FutureExt;
    use std::sync::Arc;

    fn ctx_with_confirm(confirm: ConfirmSpec) -> PipelineContext {
        let config = RequestConfig {
            confirm: Some(confirm),
            ..RequestConfig::default()
        };
        PipelineContext::new(None, config, "manual")
    }

    #[tokio::test]
    async fn test_declined_confirmation_aborts() {
        let engine = Engine::new(Document::new());
        engine
            .hooks()
            .register_confirm("ask", Arc::new(|_ctx| async { false }.boxed()));

        let mut ctx = ctx_with_confirm(ConfirmSpec::Handler("ask".to_string()));
        let flow = ConfirmStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(flow, StepFlow::Abort);
    }

    #[tokio::test]
    async fn test_missing_handler_proceeds() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_confirm(ConfirmSpec::Handler("unregistered".to_string()));
        let flow = ConfirmStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(flow, StepFlow::Continue);
    }

    #[tokio::test]
    async fn test_message_uses_prompt_handler() {
        let engine = Engine::new(Document::new());
        engine
            .hooks()
            .register_confirm(PROMPT_HANDLER, Arc::new(|_ctx| async { false }.boxed()));

        let mut ctx = ctx_with_confirm(ConfirmSpec::Message("Sure?".to_string()));
        let flow = ConfirmStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(flow, StepFlow::Abort);
    }
}
