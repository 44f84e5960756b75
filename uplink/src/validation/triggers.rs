//! Per-field trigger policy: angry on blur, forgiving on input.
//!
//! A field is validated (and marked touched) on its first blur.
//! Thereafter, while marked invalid, every input event re-validates
//! (optionally debounced) until the field becomes valid; further input is
//! ignored until the next blur. The asymmetry avoids nagging mid-typing
//! while surfacing known mistakes promptly.

use dashmap::{DashMap, DashSet};

/// What the caller should do with a field event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAction {
    /// Validate the field now.
    Validate,
    /// Validate after the debounce delay, with this generation.
    Debounce(u64),
    /// Ignore the event.
    Skip,
}

/// Touch/invalid bookkeeping for validated fields, keyed by element id.
#[derive(Debug, Default)]
pub struct FieldTriggers {
    touched: DashSet<u64>,
    invalid: DashSet<u64>,
    debounce_generation: DashMap<u64, u64>,
    debounce_ms: u64,
}

impl FieldTriggers {
    /// Creates a trigger manager without input debouncing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a trigger manager that debounces input re-validation.
    #[must_use]
    pub fn with_debounce_ms(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            ..Self::default()
        }
    }

    /// Returns the input debounce delay in milliseconds.
    #[must_use]
    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Handles a blur: the field becomes touched and validates.
    pub fn note_blur(&self, field_id: u64) -> FieldAction {
        self.touched.insert(field_id);
        FieldAction::Validate
    }

    /// Handles an input event: re-validate only while invalid.
    pub fn note_input(&self, field_id: u64) -> FieldAction {
        if !self.invalid.contains(&field_id) {
            return FieldAction::Skip;
        }
        if self.debounce_ms == 0 {
            return FieldAction::Validate;
        }
        let mut generation = self.debounce_generation.entry(field_id).or_insert(0);
        *generation += 1;
        FieldAction::Debounce(*generation)
    }

    /// Returns true if the debounce generation is still current.
    #[must_use]
    pub fn is_current_generation(&self, field_id: u64, generation: u64) -> bool {
        self.debounce_generation
            .get(&field_id)
            .map_or(false, |current| *current == generation)
    }

    /// Records a validation verdict for the field.
    pub fn record_result(&self, field_id: u64, is_valid: bool) {
        if is_valid {
            self.invalid.remove(&field_id);
        } else {
            self.invalid.insert(field_id);
        }
    }

    /// Returns true once the field has blurred at least once.
    #[must_use]
    pub fn is_touched(&self, field_id: u64) -> bool {
        self.touched.contains(&field_id)
    }

    /// Returns true while the field is marked invalid.
    #[must_use]
    pub fn is_invalid(&self, field_id: u64) -> bool {
        self.invalid.contains(&field_id)
    }

    /// Resets all bookkeeping.
    pub fn reset(&self) {
        self.touched.clear();
        self.invalid.clear();
        self.debounce_generation.clear();
    }
}
