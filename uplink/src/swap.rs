//! Content swap strategies and focus-preserving application.

use crate::dom::{Document, Element};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A content-replacement strategy.
pub trait SwapStrategy: Send + Sync {
    /// Swaps `content` into `target`, returning the element that now
    /// occupies the target's place.
    fn swap(&self, target: &Element, content: &str) -> Element;
}

/// Replaces the target's content, keeping the element itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerSwap;

impl SwapStrategy for InnerSwap {
    fn swap(&self, target: &Element, content: &str) -> Element {
        target.clear_children();
        target.set_text(content);
        target.clone()
    }
}

/// Replaces the target element itself with a fresh node of the same tag
/// carrying the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct OuterSwap;

impl SwapStrategy for OuterSwap {
    fn swap(&self, target: &Element, content: &str) -> Element {
        let replacement = Element::new(target.tag());
        replacement.set_text(content);
        if target.replace_with(&replacement) {
            replacement
        } else {
            // Detached target: nothing to splice into
            target.clone()
        }
    }
}

/// Leaves the target untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSwap;

impl SwapStrategy for NoSwap {
    fn swap(&self, target: &Element, _content: &str) -> Element {
        target.clone()
    }
}

/// Registry of named swap strategies.
pub struct SwapRegistry {
    strategies: RwLock<HashMap<String, Arc<dyn SwapStrategy>>>,
}

impl SwapRegistry {
    /// Creates a registry with the built-in strategies.
    #[must_use]
    pub fn new() -> Self {
        let registry = Self {
            strategies: RwLock::new(HashMap::new()),
        };
        registry.register("inner", Arc::new(InnerSwap));
        registry.register("outer", Arc::new(OuterSwap));
        registry.register("none", Arc::new(NoSwap));
        registry
    }

    /// Registers or replaces a strategy.
    pub fn register(&self, name: impl Into<String>, strategy: Arc<dyn SwapStrategy>) {
        self.strategies.write().insert(name.into(), strategy);
    }

    /// Returns the strategy for a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SwapStrategy>> {
        self.strategies.read().get(name).cloned()
    }
}

impl Default for SwapRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SwapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.strategies.read().keys().cloned().collect();
        f.debug_struct("SwapRegistry").field("names", &names).finish()
    }
}

/// Applies a swap, preserving keyboard focus and text selection when the
/// focused element lies outside the swap target.
pub fn apply_swap(
    document: &Document,
    strategy: &dyn SwapStrategy,
    target: &Element,
    content: &str,
) -> Element {
    let focused = document.active_element();
    let preserve = focused
        .as_ref()
        .filter(|active| !target.contains(active))
        .cloned();
    let selection = preserve.as_ref().and_then(Element::selection);

    let result = strategy.swap(target, content);

    if let Some(active) = preserve {
        if document.contains(&active) {
            document.focus(&active);
            if let Some((start, end)) = selection {
                active.set_selection(start, end);
            }
        }
    }

    result
}
