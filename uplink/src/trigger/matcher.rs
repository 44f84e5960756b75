//! Matching observed events against declared or default triggers.

use super::parser::{parse_trigger, TriggerEntry};
use crate::config::ACTION_MARKER;
use crate::context::default_trigger;
use crate::dom::Element;
use crate::trigger::UiEvent;

const TRIGGER_ATTR: &str = "data-uplink-trigger";

/// Normalizes an event type for trigger matching.
///
/// An Enter key-release becomes the synthetic `keyenter` type; used for
/// declared-trigger matching only, never for the default fallback.
#[must_use]
pub fn normalize_event_type(event: &UiEvent) -> String {
    if event.event_type == "keyup" && event.key.as_deref() == Some("Enter") {
        return "keyenter".to_string();
    }
    event.event_type.clone()
}

/// Matches a declared trigger spec against an event, returning the
/// matching entry.
#[must_use]
pub fn matches_declared(element: &Element, event: &UiEvent) -> Option<TriggerEntry> {
    let spec = element.attr(TRIGGER_ATTR);
    let entries = parse_trigger(spec.as_deref());
    let event_type = normalize_event_type(event);

    entries.into_iter().find(|entry| {
        let event_matches = entry
            .event
            .as_deref()
            .map_or(true, |declared| declared == event_type);
        let selector_matches = entry
            .selector
            .as_deref()
            .map_or(true, |selector| event.target.matches(selector));
        event_matches && selector_matches
    })
}

/// Matches an element without a declared spec against its type-appropriate
/// default trigger.
#[must_use]
pub fn matches_default(element: &Element, event: &UiEvent) -> Option<TriggerEntry> {
    // Key releases count as change for the default fallback
    let event_type = if event.event_type == "keyup" {
        "change"
    } else {
        event.event_type.as_str()
    };

    (event_type == default_trigger(element)).then(TriggerEntry::default)
}

/// Resolves the acting element for an event: the nearest ancestor bearing
/// the action marker whose trigger (declared or default) matches.
///
/// The walk stops at the first marked ancestor either way; a non-matching
/// event on a marked element is ignored, not delegated further up.
#[must_use]
pub fn find_action_element(event: &UiEvent) -> Option<(Element, TriggerEntry)> {
    let mut node = Some(event.target.clone());
    while let Some(current) = node {
        if current.has_attr(ACTION_MARKER) {
            let matched = if current.has_attr(TRIGGER_ATTR) {
                matches_declared(&current, event)
            } else {
                matches_default(&current, event)
            };
            return matched.map(|entry| (current, entry));
        }
        node = current.parent();
    }
    None
}
