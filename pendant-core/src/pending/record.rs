// pendant-core/src/pending/record.rs
use std::sync::{Mutex, MutexGuard, PoisonError};

use pendant_common::dependency::DependencyEdge;
use pendant_common::model::ModuleIdentity;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PendingState {
    #[default]
    Pending,
    Activated,
}

/// Result of offering a candidate edge to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferral<E> {
    /// Held until the module is activated.
    Deferred,
    /// The module is already activated; the edge is handed back untouched and
    /// must be traversed right away.
    Activated(E),
}

impl<E> Deferral<E> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSnapshot {
    pub module: ModuleIdentity,
    pub state: PendingState,
    pub deferred: usize,
    pub hard_edges: usize,
}

#[derive(Debug)]
struct RecordInner<E> {
    state: PendingState,
    deferred: Vec<E>,
    hard_edges: usize,
}

/// Pending state of one module for the length of a resolution run.
///
/// Every read-modify-write happens under the record's own lock, so a
/// candidate edge racing an activation is either drained by the activation
/// or handed back as [`Deferral::Activated`], never both and never neither.
#[derive(Debug)]
pub struct PendingRecord<E = DependencyEdge> {
    module: ModuleIdentity,
    inner: Mutex<RecordInner<E>>,
}

impl<E> PendingRecord<E> {
    pub fn new(module: ModuleIdentity) -> Self {
        Self {
            module,
            inner: Mutex::new(RecordInner {
                state: PendingState::Pending,
                deferred: Vec::new(),
                hard_edges: 0,
            }),
        }
    }

    pub fn module(&self) -> &ModuleIdentity {
        &self.module
    }

    pub fn state(&self) -> PendingState {
        self.lock().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == PendingState::Pending
    }

    pub fn deferred_len(&self) -> usize {
        self.lock().deferred.len()
    }

    pub fn hard_edges(&self) -> usize {
        self.lock().hard_edges
    }

    pub fn snapshot(&self) -> RecordSnapshot {
        let inner = self.lock();
        RecordSnapshot {
            module: self.module.clone(),
            state: inner.state,
            deferred: inner.deferred.len(),
            hard_edges: inner.hard_edges,
        }
    }

    pub fn record_candidate_edge(&self, edge: E) -> Deferral<E> {
        let mut inner = self.lock();
        match inner.state {
            PendingState::Pending => {
                inner.deferred.push(edge);
                trace!(
                    "Deferred candidate edge #{} for pending module '{}'",
                    inner.deferred.len(),
                    self.module
                );
                Deferral::Deferred
            }
            PendingState::Activated => {
                trace!(
                    "Module '{}' already activated, candidate edge not deferred",
                    self.module
                );
                Deferral::Activated(edge)
            }
        }
    }

    /// Counts an unconditional edge to this module. Diagnostic only; does not
    /// activate the record.
    pub fn record_hard_edge(&self) {
        self.lock().hard_edges += 1;
    }

    /// Flips the record to activated. `Some(deferred)` on the first call,
    /// `None` on every later one.
    pub(crate) fn activate(&self) -> Option<Vec<E>> {
        let mut inner = self.lock();
        match inner.state {
            PendingState::Activated => None,
            PendingState::Pending => {
                inner.state = PendingState::Activated;
                Some(std::mem::take(&mut inner.deferred))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordInner<E>> {
        // Each critical section leaves the record consistent, so a poisoned
        // lock still guards valid data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Clone> PendingRecord<E> {
    /// Copy of the currently deferred edges, in discovery order.
    pub fn deferred_edges(&self) -> Vec<E> {
        self.lock().deferred.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PendingRecord<&'static str> {
        PendingRecord::new(ModuleIdentity::new("org", "m"))
    }

    #[test]
    fn starts_pending_and_empty() {
        let record = record();
        assert_eq!(record.state(), PendingState::Pending);
        assert_eq!(record.deferred_len(), 0);
        assert_eq!(record.hard_edges(), 0);
        assert_eq!(record.module().to_string(), "org:m");
    }

    #[test]
    fn keeps_discovery_order() {
        let record = record();
        for edge in ["a", "b", "c"] {
            assert!(record.record_candidate_edge(edge).is_deferred());
        }
        assert_eq!(record.deferred_edges(), vec!["a", "b", "c"]);
        assert_eq!(record.activate(), Some(vec!["a", "b", "c"]));
    }

    #[test]
    fn activation_is_monotone_and_drains_once() {
        let record = record();
        record.record_candidate_edge("a");
        assert_eq!(record.activate(), Some(vec!["a"]));
        assert_eq!(record.activate(), None);
        assert_eq!(record.state(), PendingState::Activated);
        assert_eq!(record.deferred_len(), 0);
    }

    #[test]
    fn activated_record_hands_edges_back() {
        let record = record();
        record.activate();
        assert_eq!(record.record_candidate_edge("late"), Deferral::Activated("late"));
        assert_eq!(record.deferred_len(), 0);
        assert_eq!(record.activate(), None);
    }

    #[test]
    fn snapshot_reflects_counters() {
        let record = record();
        record.record_candidate_edge("a");
        record.record_hard_edge();
        record.record_hard_edge();
        assert_eq!(
            record.snapshot(),
            RecordSnapshot {
                module: ModuleIdentity::new("org", "m"),
                state: PendingState::Pending,
                deferred: 1,
                hard_edges: 2,
            }
        );
    }
}
