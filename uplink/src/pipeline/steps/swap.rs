//! The content-swap step.

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use crate::swap::apply_swap;
use async_trait::async_trait;
use tracing::warn;

/// Swaps the parsed body into the configured target, preserving focus
/// and selection outside the target.
pub struct SwapContentStep;

#[async_trait]
impl PipelineStep for SwapContentStep {
    fn name(&self) -> &'static str {
        "swap-content"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }
        let Some(ref target_ref) = ctx.config.target else {
            return Ok(StepFlow::Continue);
        };
        let Some(content) = ctx.body.as_ref().and_then(|body| body.as_swap_text()) else {
            return Ok(StepFlow::Continue);
        };

        let Some(target) = services.document.resolve(target_ref) else {
            warn!(target = %target_ref, "swap target not found");
            return Ok(StepFlow::Continue);
        };

        let strategy_name = ctx.config.swap.as_deref().unwrap_or("inner");
        let strategy = services
            .swaps
            .get(strategy_name)
            .ok_or_else(|| UplinkError::config(format!("unknown swap strategy \"{strategy_name}\"")))?;

        apply_swap(&services.document, strategy.as_ref(), &target, &content);
        Ok(StepFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::dom::{Document, Element};
    use crate::engine::Engine;
    use crate::response::ResponseBody;

    fn ctx_with_target(target: &str, body: Option<ResponseBody>) -> PipelineContext {
        let config = RequestConfig {
            target: Some(target.to_string()),
            ..RequestConfig::default()
        };
        let mut ctx = PipelineContext::new(None, config, "manual");
        ctx.body = body;
        ctx
    }

    #[tokio::test]
    async fn test_swaps_text_into_target() {
        let document = Document::new();
        let panel = Element::new("div");
        panel.set_attr("id", "results");
        document.root().append_child(&panel);
        let engine = Engine::new(document);

        let mut ctx = ctx_with_target("results", Some(ResponseBody::Text("OK".to_string())));
        SwapContentStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        assert_eq!(panel.text(), "OK");
    }

    #[tokio::test]
    async fn test_missing_target_warns_not_fails() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_target("ghost", Some(ResponseBody::Text("OK".to_string())));
        let flow = SwapContentStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(flow, StepFlow::Continue);
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_config_error() {
        let document = Document::new();
        let panel = Element::new("div");
        panel.set_attr("id", "results");
        document.root().append_child(&panel);
        let engine = Engine::new(document);

        let mut ctx = ctx_with_target("results", Some(ResponseBody::Text("OK".to_string())));
        ctx.config.swap = Some("morph".to_string());

        let error = SwapContentStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap_err();
        assert_eq!(error.code(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_skipped_on_error_or_missing_body() {
        let document = Document::new();
        let panel = Element::new("div");
        panel.set_attr("id", "results");
        panel.set_text("untouched");
        document.root().append_child(&panel);
        let engine = Engine::new(document);

        let mut ctx = ctx_with_target("results", None);
        SwapContentStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(panel.text(), "untouched");

        let mut ctx = ctx_with_target("results", Some(ResponseBody::Text("new".to_string())));
        ctx.fail(UplinkError::http(500, None));
        SwapContentStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        assert_eq!(panel.text(), "untouched");
    }
}
