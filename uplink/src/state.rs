//! Scoped busy-state management for the acting element.
//!
//! `StateManager` is a strict capture/apply/restore triple: whatever
//! `apply` changes, `restore` reverses, on every pipeline exit path.

use crate::config::IndicatorSpec;
use crate::dom::{Document, Element};

/// What `capture` recorded about the element.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    disabled: bool,
    aria_busy: Option<String>,
    classes: Vec<String>,
    text: String,
}

/// Captures the element's pre-run state.
#[must_use]
pub fn capture_state(element: &Element) -> StateSnapshot {
    StateSnapshot {
        disabled: element.is_disabled(),
        aria_busy: element.attr("aria-busy"),
        classes: element.classes(),
        text: element.text(),
    }
}

/// The per-run busy-state handle: created once, `apply` and `restore`
/// invoked exactly once each.
#[derive(Debug)]
pub struct StateManager {
    element: Element,
    document: Document,
    indicator: Option<IndicatorSpec>,
    snapshot: StateSnapshot,
    /// Skip disabling while the user is still actively interacting.
    debounced: bool,
    revealed_indicator: Option<Element>,
}

impl StateManager {
    /// Captures the element and prepares the handle.
    #[must_use]
    pub fn new(
        element: Element,
        document: Document,
        indicator: Option<IndicatorSpec>,
        debounced: bool,
    ) -> Self {
        let snapshot = capture_state(&element);
        Self {
            element,
            document,
            indicator,
            snapshot,
            debounced,
            revealed_indicator: None,
        }
    }

    /// Returns the captured snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    /// Applies the busy state.
    pub fn apply(&mut self) {
        self.element.set_attr("aria-busy", "true");
        if let Some(form) = self.element.parent().and_then(|p| p.closest("form")) {
            form.set_attr("aria-busy", "true");
        }

        if let Some(ref indicator) = self.indicator {
            if let Some(ref class) = indicator.class {
                self.element.add_class(class);
            }
            if let Some(ref reference) = indicator.element {
                if let Some(target) = self.document.resolve(reference) {
                    if target.has_attr("hidden") {
                        target.remove_attr("hidden");
                        self.revealed_indicator = Some(target);
                    }
                }
            }
        }

        if !self.debounced && (self.element.is_input_like() || self.element.is_button_like()) {
            self.element.set_disabled(true);
        }
    }

    /// Restores exactly what was captured and re-hides the indicator.
    pub fn restore(&mut self) {
        self.element.set_disabled(self.snapshot.disabled);

        match self.snapshot.aria_busy {
            Some(ref value) => self.element.set_attr("aria-busy", value.clone()),
            None => self.element.remove_attr("aria-busy"),
        }
        if let Some(form) = self.element.parent().and_then(|p| p.closest("form")) {
            form.remove_attr("aria-busy");
        }

        self.element.set_classes(&self.snapshot.classes);

        // Restoring text on a selection control would destroy its options
        if self.element.is_button_like() {
            self.element.set_text(self.snapshot.text.clone());
        }

        if let Some(indicator) = self.revealed_indicator.take() {
            indicator.set_attr("hidden", "");
        }
    }
}
