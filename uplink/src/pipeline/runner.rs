//! The pipeline runner.

use super::{PipelineStep, StepFlow};
use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::events::get_event_sink;
use std::sync::Arc;
use tracing::debug;

/// Runs the steps in order against one context.
///
/// Contract:
/// - a failing step's error is captured into the context (first error
///   wins) and execution continues, so teardown steps always run;
/// - once the abort latch is set, remaining steps are skipped entirely.
pub async fn run_pipeline(
    mut ctx: PipelineContext,
    steps: &[Arc<dyn PipelineStep>],
    services: &EngineServices,
) -> PipelineContext {
    let sink = get_event_sink();

    for step in steps {
        if ctx.state.aborted {
            sink.try_emit("pipeline.aborted", Some(serde_json::json!({"id": ctx.id})));
            break;
        }

        match step.execute(&mut ctx, services).await {
            Ok(StepFlow::Continue) => {}
            Ok(StepFlow::Abort) => {
                debug!(run_id = ctx.id, step = step.name(), "run aborted");
                ctx.state.aborted = true;
            }
            Err(error) => {
                sink.try_emit(
                    "pipeline.error",
                    Some(serde_json::json!({
                        "id": ctx.id,
                        "step": step.name(),
                        "error": error.to_dict(),
                    })),
                );
                ctx.fail(error);
            }
        }
    }

    sink.try_emit("pipeline.complete", Some(serde_json::json!({"id": ctx.id})));
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::engine::Engine;
    use crate::errors::UplinkError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct RecordingStep {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        result: StepFlow,
        fail: bool,
    }

    #[async_trait]
    impl PipelineStep for RecordingStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(
            &self,
            _ctx: &mut PipelineContext,
            _services: &EngineServices,
        ) -> super::super::StepResult {
            self.log.lock().push(self.name);
            if self.fail {
                return Err(UplinkError::network(self.name));
            }
            Ok(self.result)
        }
    }

    fn step(
        name: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
        result: StepFlow,
        fail: bool,
    ) -> Arc<dyn PipelineStep> {
        Arc::new(RecordingStep {
            name,
            log: log.clone(),
            result,
            fail,
        })
    }

    fn ctx() -> PipelineContext {
        PipelineContext::new(None, RequestConfig::default(), "manual")
    }

    #[tokio::test]
    async fn test_error_continues_to_later_steps() {
        let engine = Engine::new(crate::dom::Document::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let steps = vec![
            step("first", &log, StepFlow::Continue, false),
            step("boom", &log, StepFlow::Continue, true),
            step("teardown", &log, StepFlow::Continue, false),
        ];

        let result = run_pipeline(ctx(), &steps, engine.services()).await;

        assert_eq!(*log.lock(), vec!["first", "boom", "teardown"]);
        assert_eq!(result.error.unwrap().code(), "NETWORK_ERROR");
    }

    #[tokio::test]
    async fn test_first_error_wins() {
        let engine = Engine::new(crate::dom::Document::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let steps = vec![
            step("boom", &log, StepFlow::Continue, true),
            step("boom-again", &log, StepFlow::Continue, true),
        ];

        let result = run_pipeline(ctx(), &steps, engine.services()).await;
        assert_eq!(
            result.error.unwrap().to_string(),
            UplinkError::network("boom").to_string()
        );
    }

    #[tokio::test]
    async fn test_abort_skips_everything_after() {
        let engine = Engine::new(crate::dom::Document::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let steps = vec![
            step("first", &log, StepFlow::Abort, false),
            step("never", &log, StepFlow::Continue, false),
        ];

        let result = run_pipeline(ctx(), &steps, engine.services()).await;

        assert_eq!(*log.lock(), vec!["first"]);
        assert!(result.state.aborted);
        assert!(result.error.is_none());
    }
}
