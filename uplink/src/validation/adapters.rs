//! Widget adapters: a capability interface over non-native controls.
//!
//! Third-party widgets often back a visible wrapper with a hidden native
//! input. Adapters answer, per element: does this adapter apply, what is
//! the value, which element is the visible one, and which element
//! receives blur. The first matching adapter wins; native semantics are
//! the fallback.

use crate::collector::FieldValue;
use crate::dom::Element;
use parking_lot::RwLock;
use std::sync::Arc;

/// The adapter capability set.
pub trait ElementAdapter: Send + Sync {
    /// The adapter's name.
    fn name(&self) -> &str;

    /// Returns true if this adapter handles the element.
    fn matches(&self, element: &Element) -> bool;

    /// Extracts the element's value; `None` means no contribution.
    fn get_value(&self, element: &Element) -> Option<FieldValue>;

    /// Returns the element whose visibility and styling represent the
    /// control to the user.
    fn get_visible_element(&self, element: &Element) -> Element;

    /// Returns the element that receives blur events for the control.
    fn get_blur_target(&self, element: &Element) -> Element;
}

/// Priority-ordered adapter registry.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<Vec<Arc<dyn ElementAdapter>>>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter at the end of the priority order.
    pub fn register(&self, adapter: Arc<dyn ElementAdapter>) {
        self.adapters.write().push(adapter);
    }

    /// Returns true if an adapter with the name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.adapters.read().iter().any(|a| a.name() == name)
    }

    /// Returns the first adapter matching the element, if any.
    #[must_use]
    pub fn find(&self, element: &Element) -> Option<Arc<dyn ElementAdapter>> {
        self.adapters
            .read()
            .iter()
            .find(|a| a.matches(element))
            .cloned()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .adapters
            .read()
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &names)
            .finish()
    }
}

/// Native-control fallback semantics, used when no adapter matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAdapter;

impl ElementAdapter for NativeAdapter {
    fn name(&self) -> &str {
        "native"
    }

    fn matches(&self, _element: &Element) -> bool {
        true
    }

    fn get_value(&self, element: &Element) -> Option<FieldValue> {
        match element.tag().as_str() {
            "input" => match element.attr("type").as_deref() {
                Some("checkbox") => Some(FieldValue::Flag(element.is_checked())),
                Some("radio") => {
                    // The group's checked member carries the value
                    let name = element.attr("name")?;
                    let form = element.closest("form")?;
                    form.query_selector_all(&format!("input[name=\"{name}\"]"))
                        .into_iter()
                        .find(Element::is_checked)
                        .map(|checked| FieldValue::Text(checked.value().unwrap_or_default()))
                }
                _ => Some(FieldValue::Text(element.value().unwrap_or_default())),
            },
            "select" => {
                let selected: Vec<String> = element
                    .query_selector_all("option[selected]")
                    .into_iter()
                    .map(|opt| opt.value().unwrap_or_else(|| opt.text()))
                    .collect();
                if element.has_attr("multiple") {
                    Some(FieldValue::List(selected))
                } else {
                    Some(FieldValue::Text(
                        selected.into_iter().next().unwrap_or_default(),
                    ))
                }
            }
            "textarea" => Some(FieldValue::Text(
                element.value().unwrap_or_else(|| element.text()),
            )),
            _ => None,
        }
    }

    fn get_visible_element(&self, element: &Element) -> Element {
        element.clone()
    }

    fn get_blur_target(&self, element: &Element) -> Element {
        element.clone()
    }
}

/// Resolves the adapter for an element, falling back to native
/// semantics.
#[must_use]
pub fn adapter_for(registry: &AdapterRegistry, element: &Element) -> Arc<dyn ElementAdapter> {
    registry
        .find(element)
        .unwrap_or_else(|| Arc::new(NativeAdapter))
}
