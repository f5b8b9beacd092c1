// pendant-core/src/pending/state.rs
//! Pending state of every module seen during one graph traversal.
//!
//! A fresh [`PendingDependenciesState`] is created for each resolution run
//! and dropped with it. The map lock is only held for lookup-or-insert;
//! the per-module work happens under each record's own lock.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pendant_common::dependency::DependencyEdge;
use pendant_common::model::ModuleIdentity;
use serde::Serialize;
use tracing::debug;

use super::record::{PendingRecord, PendingState, RecordSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PendingSummary {
    pub modules: usize,
    pub activated: usize,
    pub pending: usize,
    pub deferred_edges: usize,
}

impl fmt::Display for PendingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules seen, {} activated, {} pending ({} deferred edges)",
            self.modules, self.activated, self.pending, self.deferred_edges
        )
    }
}

#[derive(Debug)]
pub struct PendingDependenciesState<E = DependencyEdge> {
    records: Mutex<HashMap<ModuleIdentity, Arc<PendingRecord<E>>>>,
}

impl<E> Default for PendingDependenciesState<E> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<E> PendingDependenciesState<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `module`, inserting a pending one on first sight.
    pub fn get_or_create(&self, module: &ModuleIdentity) -> Arc<PendingRecord<E>> {
        let mut records = self.lock();
        if let Some(record) = records.get(module) {
            return Arc::clone(record);
        }
        let record = Arc::new(PendingRecord::new(module.clone()));
        records.insert(module.clone(), Arc::clone(&record));
        record
    }

    /// Lookup without inserting.
    pub fn get(&self, module: &ModuleIdentity) -> Option<Arc<PendingRecord<E>>> {
        self.lock().get(module).cloned()
    }

    /// Marks `module` activated and returns the edges deferred until now.
    /// Empty if the module was already activated.
    pub fn activate(&self, module: &ModuleIdentity) -> Vec<E> {
        self.activate_if_pending(module).unwrap_or_default()
    }

    /// Like [`activate`](Self::activate), but `None` when an earlier call
    /// already activated the module. Exactly one caller per module ever sees
    /// `Some`.
    pub fn activate_if_pending(&self, module: &ModuleIdentity) -> Option<Vec<E>> {
        let replay = self.get_or_create(module).activate()?;
        debug!(
            "Activated '{}', replaying {} deferred edge(s)",
            module,
            replay.len()
        );
        Some(replay)
    }

    /// Unknown modules count as pending.
    pub fn is_pending(&self, module: &ModuleIdentity) -> bool {
        self.get(module).is_none_or(|record| record.is_pending())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn summary(&self) -> PendingSummary {
        let mut summary = PendingSummary::default();
        for snapshot in self.snapshots() {
            summary.modules += 1;
            summary.deferred_edges += snapshot.deferred;
            match snapshot.state {
                PendingState::Pending => summary.pending += 1,
                PendingState::Activated => summary.activated += 1,
            }
        }
        summary
    }

    /// Modules only ever reached through candidate edges, sorted.
    pub fn still_pending(&self) -> Vec<ModuleIdentity> {
        self.snapshots()
            .into_iter()
            .filter(|s| s.state == PendingState::Pending)
            .map(|s| s.module)
            .collect()
    }

    /// Snapshots of every record, sorted by identity.
    pub fn snapshots(&self) -> Vec<RecordSnapshot> {
        // Copy the handles out first so record locks are never taken while
        // the map lock is held.
        let records: Vec<Arc<PendingRecord<E>>> = self.lock().values().cloned().collect();
        let mut snapshots: Vec<RecordSnapshot> = records.iter().map(|r| r.snapshot()).collect();
        snapshots.sort_by(|a, b| a.module.cmp(&b.module));
        snapshots
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ModuleIdentity, Arc<PendingRecord<E>>>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
