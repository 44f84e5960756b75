//! Named-function registries the embedding application populates.
//!
//! Markup declares hook, confirm-handler, and extractor names; resolution
//! happens against these registries at run time. A missing name logs a
//! warning and is treated as absent, never fatal.

use crate::collector::FieldValue;
use crate::context::PipelineContext;
use crate::dom::Element;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A before/after hook. Before-hooks returning `Ok(false)` abort the run;
/// after-hooks' return value is ignored. Hook errors fail the run.
pub type HookFn =
    Arc<dyn for<'a> Fn(&'a mut PipelineContext) -> BoxFuture<'a, anyhow::Result<bool>> + Send + Sync>;

/// A confirm handler. Returning `false` aborts the run.
pub type ConfirmFn =
    Arc<dyn for<'a> Fn(&'a PipelineContext) -> BoxFuture<'a, bool> + Send + Sync>;

/// A custom field-value extractor. `None` means the field contributes
/// nothing.
pub type ExtractorFn = Arc<dyn Fn(&Element) -> Option<FieldValue> + Send + Sync>;

/// Registries for hooks, confirm handlers, and value extractors.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<HashMap<String, HookFn>>,
    confirms: RwLock<HashMap<String, ConfirmFn>>,
    extractors: RwLock<HashMap<String, ExtractorFn>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a named hook.
    pub fn register_hook(&self, name: impl Into<String>, hook: HookFn) {
        self.hooks.write().insert(name.into(), hook);
    }

    /// Returns the hook for a name.
    #[must_use]
    pub fn hook(&self, name: &str) -> Option<HookFn> {
        self.hooks.read().get(name).cloned()
    }

    /// Registers or replaces a named confirm handler.
    pub fn register_confirm(&self, name: impl Into<String>, handler: ConfirmFn) {
        self.confirms.write().insert(name.into(), handler);
    }

    /// Returns the confirm handler for a name.
    #[must_use]
    pub fn confirm(&self, name: &str) -> Option<ConfirmFn> {
        self.confirms.read().get(name).cloned()
    }

    /// Registers or replaces a named value extractor.
    pub fn register_extractor(&self, name: impl Into<String>, extractor: ExtractorFn) {
        self.extractors.write().insert(name.into(), extractor);
    }

    /// Returns the extractor for a name.
    #[must_use]
    pub fn extractor(&self, name: &str) -> Option<ExtractorFn> {
        self.extractors.read().get(name).cloned()
    }

    /// Lists registered hook names.
    #[must_use]
    pub fn hook_names(&self) -> Vec<String> {
        self.hooks.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.read().len())
            .field("confirms", &self.confirms.read().len())
            .field("extractors", &self.extractors.read().len())
            .finish()
    }
}
