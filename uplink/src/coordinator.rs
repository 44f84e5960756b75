//! Concurrency coordination: at most one effectively-running pipeline per
//! acting element, per configured strategy.
//!
//! The registry is an injectable service owned by the engine rather than
//! ambient global state, so tests get per-instance isolation. Its single
//! invariant: an element with no in-flight run has no entry.

use crate::cancellation::CancellationToken;
use crate::config::ConcurrencyStrategy;
use dashmap::DashMap;
use std::sync::Arc;

/// One in-flight run.
#[derive(Debug, Clone)]
struct InFlight {
    run_id: u64,
    cancellation: Arc<CancellationToken>,
}

/// The decision for a run entering coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// The run proceeds and owns (or shares) the element's slot.
    Admitted,
    /// A run is already in flight and the strategy drops this one.
    Duplicate,
}

/// Per-element in-flight registry.
#[derive(Debug, Default)]
pub struct ConcurrencyCoordinator {
    active: DashMap<u64, InFlight>,
}

impl ConcurrencyCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a run for an element, applying the dedup strategy.
    ///
    /// A `Duplicate` outcome means the caller must abort without having
    /// installed an entry.
    pub fn enter(
        &self,
        element_id: u64,
        run_id: u64,
        cancellation: Arc<CancellationToken>,
        strategy: ConcurrencyStrategy,
    ) -> EnterOutcome {
        match self.active.entry(element_id) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(InFlight {
                    run_id,
                    cancellation,
                });
                EnterOutcome::Admitted
            }
            dashmap::mapref::entry::Entry::Occupied(mut slot) => match strategy {
                ConcurrencyStrategy::Ignore => EnterOutcome::Duplicate,
                ConcurrencyStrategy::AbortPrevious => {
                    slot.get()
                        .cancellation
                        .cancel(format!("superseded by run {run_id}"));
                    slot.insert(InFlight {
                        run_id,
                        cancellation,
                    });
                    EnterOutcome::Admitted
                }
                // Sequencing is not implemented; the run proceeds and the
                // existing entry keeps the slot.
                ConcurrencyStrategy::Queue => EnterOutcome::Admitted,
            },
        }
    }

    /// Removes the element's entry, but only when it still belongs to the
    /// given run. A late-finishing superseded run must not evict a newer
    /// run's entry.
    pub fn cleanup(&self, element_id: u64, run_id: u64) {
        self.active
            .remove_if(&element_id, |_, entry| entry.run_id == run_id);
    }

    /// Returns true if the element has an in-flight run.
    #[must_use]
    pub fn is_active(&self, element_id: u64) -> bool {
        self.active.contains_key(&element_id)
    }

    /// Returns the number of in-flight entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true when nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
