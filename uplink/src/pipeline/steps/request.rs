//! Request building and execution.

use crate::config::declared_method_and_url;
use crate::context::PipelineContext;
use crate::engine::EngineServices;
use crate::errors::UplinkError;
use crate::pipeline::{PipelineStep, StepFlow, StepResult};
use crate::retry::execute_with_retry;
use crate::serialize::urlencode_pairs;
use crate::transport::{Method, Request};
use async_trait::async_trait;
use chrono::Utc;

/// Resolves method and URL, builds the query or body, and assembles the
/// request.
pub struct BuildRequestStep;

#[async_trait]
impl PipelineStep for BuildRequestStep {
    fn name(&self) -> &'static str {
        "build-request"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }

        let declared = ctx.element().as_ref().and_then(declared_method_and_url);
        let url = ctx
            .config
            .url
            .clone()
            .or_else(|| declared.as_ref().map(|(_, url)| url.clone()))
            .ok_or_else(|| UplinkError::config("URL is required"))?;
        let method = ctx
            .config
            .method
            .or_else(|| declared.map(|(method, _)| method))
            .unwrap_or(Method::Get);

        let mut request = Request::new(method, url);
        for (name, value) in &ctx.config.headers {
            request.set_header(name, value.clone());
        }

        let collected = ctx.collect.as_ref();
        let data = collected.map(|c| &c.data).filter(|data| !data.is_empty());

        if let Some(data) = data {
            if method == Method::Get {
                let query = urlencode_pairs(data);
                if !query.is_empty() {
                    let separator = if request.url.contains('?') { '&' } else { '?' };
                    request.url = format!("{}{}{}", request.url, separator, query);
                }
            } else {
                // Form sources default to multipart, everything else to a
                // JSON object
                let source_is_form = collected
                    .and_then(|c| c.source.as_ref())
                    .map_or(false, crate::dom::Element::is_form_like);
                let default_serializer = if source_is_form { "formdata" } else { "json" };
                let name = ctx
                    .config
                    .serialize
                    .as_deref()
                    .unwrap_or(default_serializer);

                let serializer = services
                    .serializers
                    .get(name)
                    .ok_or_else(|| UplinkError::config(format!("unknown serializer \"{name}\"")))?;

                let serialized = serializer(data);
                if let Some(content_type) = serialized.content_type {
                    if request.header("content-type").is_none() {
                        request.set_header("content-type", content_type);
                    }
                }
                request.body = Some(serialized.bytes);
            }
        }

        ctx.request = Some(request);
        Ok(StepFlow::Continue)
    }
}

/// Executes the request through the transport, wrapped by the retry
/// executor and wired to the run's cancellation token.
pub struct ExecuteRequestStep;

#[async_trait]
impl PipelineStep for ExecuteRequestStep {
    fn name(&self) -> &'static str {
        "execute-request"
    }

    async fn execute(&self, ctx: &mut PipelineContext, services: &EngineServices) -> StepResult {
        if ctx.has_error() {
            return Ok(StepFlow::Continue);
        }
        let Some(request) = ctx.request.clone() else {
            return Err(UplinkError::config("request not built"));
        };

        ctx.state.started_at = Some(Utc::now());

        let transport = services.transport.clone();
        let cancellation = ctx.cancellation.clone();
        let operation = || {
            let transport = transport.clone();
            let cancellation = cancellation.clone();
            let request = request.clone();
            async move { transport.send(&request, &cancellation).await }
        };

        let outcome = match ctx.config.retry.resolve(&services.default_retry) {
            Some(policy) => execute_with_retry(&policy, &mut ctx.state.attempts, operation).await,
            None => {
                ctx.state.attempts = 1;
                operation().await
            }
        };

        let finished = Utc::now();
        ctx.state.finished_at = Some(finished);
        ctx.state.duration_ms = ctx
            .state
            .started_at
            .map(|started| (finished - started).num_milliseconds());

        ctx.response = Some(outcome?);
        Ok(StepFlow::Continue)
    }
}
