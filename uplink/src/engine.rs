//! The engine: owns the service registries and exposes the public entry
//! points - programmatic triggering and observed-event dispatch.

use crate::collector::{Collected, FieldMap};
use crate::config::{resolve_config, ConfigPatch};
use crate::context::{default_trigger, PipelineContext};
use crate::coordinator::ConcurrencyCoordinator;
use crate::dom::{Document, Element};
use crate::errors::UplinkError;
use crate::hooks::HookRegistry;
use crate::pipeline::{default_steps, runner::run_pipeline, PipelineStep};
use crate::retry::RetryPolicy;
use crate::serialize::SerializerRegistry;
use crate::swap::SwapRegistry;
use crate::transport::{HttpTransport, Transport};
use crate::trigger::{find_action_element, normalize_event_type, DelegationState, UiEvent};
use crate::validation::{FieldAction, FieldTriggers, ValidateOptions, ValidationEngine, ValidationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The services shared by every pipeline run of one engine.
pub struct EngineServices {
    /// The element tree.
    pub document: Document,
    /// The network seam.
    pub transport: Arc<dyn Transport>,
    /// The per-element in-flight registry.
    pub coordinator: ConcurrencyCoordinator,
    /// Hook, confirm, and extractor registries.
    pub hooks: HookRegistry,
    /// The validation engine.
    pub validation: ValidationEngine,
    /// Touch/invalid bookkeeping for validated fields.
    pub field_triggers: FieldTriggers,
    /// Named body serializers.
    pub serializers: SerializerRegistry,
    /// Named swap strategies.
    pub swaps: SwapRegistry,
    /// Debounce/throttle bookkeeping for action triggers.
    pub delegation: DelegationState,
    /// The engine-default configuration layer.
    pub defaults: ConfigPatch,
    /// The default retry policy.
    pub default_retry: RetryPolicy,
}

/// Call-site options for a programmatic run.
#[derive(Debug, Clone, Default)]
pub struct TriggerOptions {
    /// Call-site configuration overrides (the highest layer).
    pub config: ConfigPatch,
    /// Overrides the trigger name recorded on the context.
    pub trigger: Option<String>,
    /// Preset field data, bypassing collection.
    pub data: Option<FieldMap>,
}

impl TriggerOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets configuration overrides.
    #[must_use]
    pub fn with_config(mut self, config: ConfigPatch) -> Self {
        self.config = config;
        self
    }

    /// Sets the trigger name.
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Presets field data.
    #[must_use]
    pub fn with_data(mut self, data: FieldMap) -> Self {
        self.data = Some(data);
        self
    }
}

/// What dispatch did with an observed event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No acting element matched the event.
    Ignored,
    /// The event fell inside a throttle window and was dropped.
    Throttled,
    /// A debounce window (re)started; the handle yields `None` when a
    /// later event superseded this one.
    Debounced(JoinHandle<Option<Result<PipelineContext, UplinkError>>>),
    /// A run started.
    Started(JoinHandle<Result<PipelineContext, UplinkError>>),
}

/// Builds an engine with explicit services.
pub struct EngineBuilder {
    document: Document,
    transport: Arc<dyn Transport>,
    defaults: ConfigPatch,
    default_retry: RetryPolicy,
    field_debounce_ms: u64,
}

impl EngineBuilder {
    /// Starts a builder over a document.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            transport: Arc::new(HttpTransport::new()),
            defaults: ConfigPatch::new(),
            default_retry: RetryPolicy::default(),
            field_debounce_ms: 150,
        }
    }

    /// Replaces the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the engine-default configuration layer.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ConfigPatch) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the default retry policy.
    #[must_use]
    pub fn with_default_retry(mut self, policy: RetryPolicy) -> Self {
        self.default_retry = policy;
        self
    }

    /// Sets the field-revalidation debounce delay.
    #[must_use]
    pub fn with_field_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.field_debounce_ms = debounce_ms;
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            services: Arc::new(EngineServices {
                document: self.document,
                transport: self.transport,
                coordinator: ConcurrencyCoordinator::new(),
                hooks: HookRegistry::new(),
                validation: ValidationEngine::new(),
                field_triggers: FieldTriggers::with_debounce_ms(self.field_debounce_ms),
                serializers: SerializerRegistry::new(),
                swaps: SwapRegistry::new(),
                delegation: DelegationState::new(),
                defaults: self.defaults,
                default_retry: self.default_retry,
            }),
            steps: Arc::new(default_steps()),
        }
    }
}

/// The request-orchestration engine.
#[derive(Clone)]
pub struct Engine {
    services: Arc<EngineServices>,
    steps: Arc<Vec<Arc<dyn PipelineStep>>>,
}

impl Engine {
    /// Creates an engine with default services over a document.
    #[must_use]
    pub fn new(document: Document) -> Self {
        EngineBuilder::new(document).build()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(document: Document) -> EngineBuilder {
        EngineBuilder::new(document)
    }

    /// Returns the shared services.
    #[must_use]
    pub fn services(&self) -> &EngineServices {
        &self.services
    }

    /// Returns the document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.services.document
    }

    /// Returns the hook registries.
    #[must_use]
    pub fn hooks(&self) -> &HookRegistry {
        &self.services.hooks
    }

    /// Returns the validation engine.
    #[must_use]
    pub fn validation(&self) -> &ValidationEngine {
        &self.services.validation
    }

    /// Runs the pipeline for an element.
    ///
    /// Returns the terminal context, or the run's terminal error; hook
    /// collaborators have already observed the context either way.
    pub async fn trigger(
        &self,
        element: &Element,
        options: TriggerOptions,
    ) -> Result<PipelineContext, UplinkError> {
        let ctx = self.build_context(Some(element), options, false);
        self.run_context(ctx).await
    }

    /// Runs a purely programmatic pipeline (no acting element).
    pub async fn request(&self, options: TriggerOptions) -> Result<PipelineContext, UplinkError> {
        let ctx = self.build_context(None, options, false);
        self.run_context(ctx).await
    }

    /// Binds an element for repeated programmatic execution.
    #[must_use]
    pub fn from(&self, element: &Element) -> BoundElement {
        BoundElement {
            engine: self.clone(),
            element: element.clone(),
        }
    }

    /// Feeds one observed UI event through delegation.
    ///
    /// Field-level blur/input events drive the validation trigger policy;
    /// action events resolve to the nearest marked ancestor, honoring the
    /// declared trigger spec and its debounce/throttle modifiers.
    pub fn dispatch(&self, event: &UiEvent) -> DispatchOutcome {
        if matches!(event.event_type.as_str(), "blur" | "input")
            && event.target.attr("data-val").as_deref() == Some("true")
        {
            self.handle_field_event(event);
        }

        let Some((element, entry)) = find_action_element(event) else {
            return DispatchOutcome::Ignored;
        };
        let trigger = normalize_event_type(event);

        if !entry.delay.is_zero() {
            let generation = self.services.delegation.begin_debounce(element.id());
            let engine = self.clone();
            let delay = entry.delay;
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !engine
                    .services
                    .delegation
                    .finish_debounce(element.id(), generation)
                {
                    return None;
                }
                Some(engine.run_element(element, trigger, true).await)
            });
            return DispatchOutcome::Debounced(handle);
        }

        if !entry.throttle.is_zero()
            && !self
                .services
                .delegation
                .throttle_admit(element.id(), entry.throttle)
        {
            return DispatchOutcome::Throttled;
        }

        let engine = self.clone();
        let handle =
            tokio::spawn(async move { engine.run_element(element, trigger, false).await });
        DispatchOutcome::Started(handle)
    }

    /// Validates one field immediately, recording the verdict and
    /// painting the result.
    pub fn validate_field_now(&self, field: &Element) -> ValidationResult {
        let result = self
            .services
            .validation
            .validate_field(field, ValidateOptions::showing_errors());
        self.services
            .field_triggers
            .record_result(field.id(), result.is_valid());
        result
    }

    fn handle_field_event(&self, event: &UiEvent) {
        let field = event.target.clone();
        match event.event_type.as_str() {
            "blur" => {
                self.services.field_triggers.note_blur(field.id());
                self.validate_field_now(&field);
            }
            "input" => match self.services.field_triggers.note_input(field.id()) {
                FieldAction::Validate => {
                    self.validate_field_now(&field);
                }
                FieldAction::Debounce(generation) => {
                    let engine = self.clone();
                    let delay = Duration::from_millis(self.services.field_triggers.debounce_ms());
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if engine
                            .services
                            .field_triggers
                            .is_current_generation(field.id(), generation)
                        {
                            engine.validate_field_now(&field);
                        }
                    });
                }
                FieldAction::Skip => {}
            },
            _ => {}
        }
    }

    async fn run_element(
        &self,
        element: Element,
        trigger: String,
        debounced: bool,
    ) -> Result<PipelineContext, UplinkError> {
        let options = TriggerOptions::new().with_trigger(trigger);
        let ctx = self.build_context(Some(&element), options, debounced);
        self.run_context(ctx).await
    }

    fn build_context(
        &self,
        element: Option<&Element>,
        options: TriggerOptions,
        debounced: bool,
    ) -> PipelineContext {
        let config = resolve_config(&self.services.defaults, element, &options.config);
        let trigger = options
            .trigger
            .unwrap_or_else(|| element.map_or_else(|| "manual".to_string(), |el| default_trigger(el).to_string()));

        let mut ctx = PipelineContext::new(element, config, trigger);
        ctx.state.debounced = debounced;
        if let Some(data) = options.data {
            ctx.collect = Some(Collected {
                source: element.cloned(),
                data,
            });
        }
        ctx
    }

    async fn run_context(
        &self,
        ctx: PipelineContext,
    ) -> Result<PipelineContext, UplinkError> {
        let ctx = run_pipeline(ctx, &self.steps, &self.services).await;
        match ctx.error {
            Some(ref error) => Err(error.clone()),
            None => Ok(ctx),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("document", &self.services.document)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

/// An element bound for repeated programmatic execution.
#[derive(Debug, Clone)]
pub struct BoundElement {
    engine: Engine,
    element: Element,
}

impl BoundElement {
    /// Executes the bound element's pipeline with call-site overrides.
    pub async fn execute(
        &self,
        options: TriggerOptions,
    ) -> Result<PipelineContext, UplinkError> {
        self.engine.trigger(&self.element, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::Response;

    fn engine_with(transport: MockTransport) -> Engine {
        Engine::builder(Document::new())
            .with_transport(Arc::new(transport))
            .build()
    }

    #[tokio::test]
    async fn test_request_requires_url() {
        let engine = engine_with(MockTransport::new());
        let error = engine.request(TriggerOptions::new()).await.unwrap_err();
        assert_eq!(error.code(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_programmatic_request_round_trip() {
        let transport = MockTransport::new();
        transport.enqueue(Response::new(200, b"OK".to_vec()).with_header("content-type", "text/plain"));
        let engine = engine_with(transport);

        let options = TriggerOptions::new()
            .with_config(ConfigPatch::new().with_url("/api/ping"));
        let ctx = engine.request(options).await.unwrap();

        assert!(ctx.success);
        assert_eq!(ctx.trigger, "manual");
        assert_eq!(ctx.state.attempts, 1);
    }

    #[tokio::test]
    async fn test_from_binds_element() {
        let transport = MockTransport::new();
        transport.enqueue(Response::new(200, Vec::new()));
        let document = Document::new();
        let button = Element::new("button");
        button.set_attr("data-uplink", "");
        button.set_attr("data-uplink-post", "/save");
        document.root().append_child(&button);

        let engine = Engine::builder(document)
            .with_transport(Arc::new(transport))
            .build();

        let ctx = engine
            .from(&button)
            .execute(TriggerOptions::new())
            .await
            .unwrap();
        assert_eq!(ctx.request.unwrap().method, crate::transport::Method::Post);
    }
}
