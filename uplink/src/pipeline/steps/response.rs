//! Response parsing and routing.

use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::events::get_event_sink;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use crate::response::parse_body;
use async_trait::async_trait;

/// Parses the response body by content type and normalizes problem
/// payloads.
pub struct ParseResponseStep;

#[async_trait]
impl PipelineStep for ParseResponseStep {
    fn name(&self) -> &'static str {
        "parse-response"
    }

    async fn execute(&self, ctx: &mut PipelineContext, _services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }
        let Some(ref response) = ctx.response else {
            return Ok(StepFlow::Continue);
        };

        let (body, problem) = parse_body(response);
        ctx.body = Some(body);
        ctx.validation = problem;
        Ok(StepFlow::Continue)
    }
}

/// Classifies the response: 2xx success, server-validation failure, or a
/// plain HTTP failure. A pre-existing error is never cleared or
/// overwritten - once failed, a run stays failed.
pub struct RouteResponseStep;

#[async_trait]
impl PipelineStep for RouteResponseStep {
    fn name(&self) -> &'static str {
        "route-response"
    }

    async fn execute(&self, ctx: &mut PipelineContext, _services: &EngineServices) -> StepResult {
        let sink = get_event_sink();

        let (status, status_text, is_success) = match ctx.response {
            Some(ref response) if !ctx.has_error() => (
                response.status,
                response.status_text.clone(),
                response.is_success(),
            ),
            _ => {
                ctx.success = false;
                return Ok(StepFlow::Continue);
            }
        };

        if is_success {
            ctx.success = true;
            sink.try_emit(
                "response.route",
                Some(serde_json::json!({"id": ctx.id, "status": "success"})),
            );
            return Ok(StepFlow::Continue);
        }

        ctx.success = false;
        if let Some(ref validation) = ctx.validation {
            sink.try_emit(
                "response.route",
                Some(serde_json::json!({"id": ctx.id, "status": "validation-error"})),
            );
            Err(UplinkError::server_validation(validation.title.clone()))
        } else {
            sink.try_emit(
                "response.route",
                Some(serde_json::json!({"id": ctx.id, "status": "error"})),
            );
            Err(UplinkError::http(status, Some(&status_text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequestConfig;
    use crate::dom::Document;
    use crate::engine::Engine;
    use crate::response::ResponseBody;
    use crate::transport::Response;

    fn ctx_with_response(response: Response) -> PipelineContext {
        let mut ctx = PipelineContext::new(None, RequestConfig::default(), "manual");
        ctx.response = Some(response);
        ctx
    }

    #[tokio::test]
    async fn test_success_routing() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_response(
            Response::new(200, b"OK".to_vec()).with_header("content-type", "text/plain"),
        );

        ParseResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        RouteResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        assert!(ctx.success);
        assert_eq!(ctx.body, Some(ResponseBody::Text("OK".to_string())));
    }

    #[tokio::test]
    async fn test_problem_response_routes_to_server_validation() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_response(
            Response::new(
                400,
                br#"{"title": "Validation failed", "errors": {"email": ["Required"]}}"#.to_vec(),
            )
            .with_header("content-type", "application/json"),
        );

        ParseResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        let error = RouteResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap_err();

        assert_eq!(error.code(), "SERVER_VALIDATION_ERROR");
        assert_eq!(error.to_string(), "Validation failed");
        assert!(!ctx.success);
        assert_eq!(ctx.validation.unwrap().errors["email"], vec!["Required"]);
    }

    #[tokio::test]
    async fn test_plain_http_error() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_response(
            Response::new(503, Vec::new()).with_status_text("Service Unavailable"),
        );

        ParseResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();
        let error = RouteResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap_err();

        assert_eq!(
            error,
            UplinkError::Http {
                status: 503,
                status_text: "Service Unavailable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_status_text_fallback() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_response(Response::new(500, Vec::new()));

        let error = RouteResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("request failed"));
    }

    #[tokio::test]
    async fn test_pre_existing_error_never_overwritten() {
        let engine = Engine::new(Document::new());
        let mut ctx = ctx_with_response(Response::new(200, b"OK".to_vec()));
        ctx.fail(UplinkError::validation(vec!["email".to_string()]));

        RouteResponseStep
            .execute(&mut ctx, engine.services())
            .await
            .unwrap();

        // Even a successful response cannot resurrect a failed run
        assert!(!ctx.success);
        assert_eq!(ctx.error.unwrap().code(), "VALIDATION_ERROR");
    }
}
