//! Trigger matching and event delegation.
//!
//! The embedding application feeds every observed UI event into one
//! dispatch surface; the delegator resolves the acting element, applies
//! debounce/throttle modifiers, and hands admitted events to the engine.

mod matcher;
mod parser;

pub use matcher::{find_action_element, matches_declared, matches_default, normalize_event_type};
pub use parser::{parse_trigger, TriggerEntry};

use crate::dom::Element;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Event types the delegation surface observes.
pub const OBSERVED_EVENTS: [&str; 7] =
    ["click", "submit", "change", "input", "scroll", "keyup", "blur"];

/// An observed UI event.
#[derive(Debug, Clone)]
pub struct UiEvent {
    /// The event type (e.g. "click").
    pub event_type: String,
    /// The original target element.
    pub target: Element,
    /// The key name, for keyboard events.
    pub key: Option<String>,
}

impl UiEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, target: Element) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            key: None,
        }
    }

    /// Attaches a key name.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Per-element debounce and throttle bookkeeping, owned by the engine's
/// delegator rather than ambient globals. Entries are self-cleaning: the
/// surviving debounce firing removes its generation, and throttle stamps
/// are overwritten per acceptance.
#[derive(Debug, Default)]
pub struct DelegationState {
    debounce_generation: DashMap<u64, u64>,
    throttle_last: DashMap<u64, Instant>,
}

impl DelegationState {
    /// Creates empty delegation state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a debounce window, returning the generation
    /// that must still be current when the timer fires.
    pub fn begin_debounce(&self, element_id: u64) -> u64 {
        let mut generation = self.debounce_generation.entry(element_id).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Returns true and clears the entry if the generation survived;
    /// a superseded timer returns false.
    pub fn finish_debounce(&self, element_id: u64, generation: u64) -> bool {
        let current = self
            .debounce_generation
            .get(&element_id)
            .map(|current| *current);
        if current == Some(generation) {
            self.debounce_generation.remove(&element_id);
            true
        } else {
            false
        }
    }

    /// Applies a throttle window: true admits the event and stamps the
    /// window; events inside the window are dropped, not queued.
    pub fn throttle_admit(&self, element_id: u64, window: Duration) -> bool {
        let now = Instant::now();
        match self.throttle_last.entry(element_id) {
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                if now.duration_since(*slot.get()) >= window {
                    slot.insert(now);
                    true
                } else {
                    false
                }
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    /// Clears all bookkeeping for an element.
    pub fn forget(&self, element_id: u64) {
        self.debounce_generation.remove(&element_id);
        self.throttle_last.remove(&element_id);
    }
}
