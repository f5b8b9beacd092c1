// pendant-core/src/walker/mod.rs
//! Graph walking on top of the pending registry.
//!
//! Both walkers share [`visit_module`]: it offers every declared edge of one
//! module to the registry and reports which edges became real and which
//! targets were activated by this visit. The walkers only differ in how
//! they schedule the next visits.
use std::collections::{BTreeMap, BTreeSet};

use pendant_common::dependency::{DependencyEdge, ModuleGraph};
use pendant_common::error::{PendantError, Result};
use pendant_common::model::ModuleIdentity;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::pending::{
    Deferral, PendingDependenciesState, PendingState, PendingSummary, RecordSnapshot,
};

pub mod engine;
pub mod sequential;

pub use engine::ParallelWalker;
pub use sequential::GraphWalker;

/// What offering one edge to the registry decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    /// This edge activated its target: visit the target and accept every
    /// replayed edge followed by this one.
    Activated(Vec<DependencyEdge>),
    /// The target is already active, so the edge counts right away.
    Accepted(DependencyEdge),
    /// Held by the target's record until it is activated.
    Deferred,
}

pub fn classify_edge(state: &PendingDependenciesState, edge: DependencyEdge) -> EdgeDecision {
    let record = state.get_or_create(&edge.to);
    if edge.is_candidate() {
        return match record.record_candidate_edge(edge) {
            Deferral::Deferred => EdgeDecision::Deferred,
            Deferral::Activated(edge) => EdgeDecision::Accepted(edge),
        };
    }

    record.record_hard_edge();
    match state.activate_if_pending(&edge.to) {
        Some(mut replay) => {
            replay.push(edge);
            EdgeDecision::Activated(replay)
        }
        None => EdgeDecision::Accepted(edge),
    }
}

/// Everything one module visit produced.
#[derive(Debug, Clone)]
pub struct VisitReport {
    pub module: ModuleIdentity,
    /// The module has no descriptor in the graph.
    pub missing: bool,
    pub accepted: Vec<DependencyEdge>,
    /// Targets this visit activated, in discovery order.
    pub activated: Vec<ModuleIdentity>,
}

impl VisitReport {
    pub fn new(module: ModuleIdentity) -> Self {
        Self {
            module,
            missing: false,
            accepted: Vec::new(),
            activated: Vec::new(),
        }
    }
}

pub fn visit_module(
    graph: &ModuleGraph,
    state: &PendingDependenciesState,
    module: ModuleIdentity,
) -> VisitReport {
    let mut report = VisitReport::new(module);
    let Some(dependencies) = graph.dependencies_of(&report.module) else {
        report.missing = true;
        return report;
    };

    trace!(
        "Visiting '{}' ({} declared dependencies)",
        report.module,
        dependencies.len()
    );
    for declared in dependencies {
        let edge = DependencyEdge::new(report.module.clone(), declared);
        match classify_edge(state, edge) {
            EdgeDecision::Activated(edges) => {
                if let Some(last) = edges.last() {
                    report.activated.push(last.to.clone());
                }
                report.accepted.extend(edges);
            }
            EdgeDecision::Accepted(edge) => report.accepted.push(edge),
            EdgeDecision::Deferred => {}
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingModule {
    pub module: ModuleIdentity,
    pub deferred_edges: usize,
}

impl From<RecordSnapshot> for PendingModule {
    fn from(snapshot: RecordSnapshot) -> Self {
        Self {
            module: snapshot.module,
            deferred_edges: snapshot.deferred,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkOutcome {
    /// Activated modules in the order they were visited.
    pub visit_order: Vec<ModuleIdentity>,
    /// Real incoming edges of every activated module, replayed ones included.
    pub incoming: BTreeMap<ModuleIdentity, Vec<DependencyEdge>>,
    /// Modules only ever reached through candidate edges.
    pub pending: Vec<PendingModule>,
    /// Activated modules without a descriptor in the graph.
    pub missing: BTreeSet<ModuleIdentity>,
    /// Unconditional edges that reached each activated module. Roots count
    /// only the edges found during the walk.
    pub hard_edges: BTreeMap<ModuleIdentity, usize>,
    pub summary: PendingSummary,
}

impl WalkOutcome {
    pub fn activated(&self) -> BTreeSet<&ModuleIdentity> {
        self.visit_order.iter().collect()
    }

    pub fn is_activated(&self, module: &ModuleIdentity) -> bool {
        self.visit_order.contains(module)
    }

    pub fn incoming_to(&self, module: &ModuleIdentity) -> &[DependencyEdge] {
        self.incoming.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn hard_edges_to(&self, module: &ModuleIdentity) -> usize {
        self.hard_edges.get(module).copied().unwrap_or(0)
    }

    /// Folds a visit into the outcome. Fails on a missing module when
    /// `fail_on_missing` is set.
    pub(crate) fn absorb(&mut self, report: VisitReport, fail_on_missing: bool) -> Result<()> {
        if report.missing {
            let required_by: Vec<String> = self
                .incoming_to(&report.module)
                .iter()
                .map(|e| e.from.to_string())
                .collect();
            warn!(
                "Module '{}' (required by {:?}) is not declared in the graph",
                report.module, required_by
            );
            if fail_on_missing {
                return Err(PendantError::NotFound(format!(
                    "'{}' is required by {} but not declared in the graph",
                    report.module,
                    required_by.join(", ")
                )));
            }
            self.missing.insert(report.module.clone());
        }
        for edge in report.accepted {
            self.incoming.entry(edge.to.clone()).or_default().push(edge);
        }
        self.visit_order.push(report.module);
        Ok(())
    }

    pub(crate) fn finish(&mut self, state: &PendingDependenciesState) {
        let mut pending = Vec::new();
        for snapshot in state.snapshots() {
            match snapshot.state {
                PendingState::Pending => pending.push(PendingModule::from(snapshot)),
                PendingState::Activated => {
                    self.hard_edges.insert(snapshot.module, snapshot.hard_edges);
                }
            }
        }
        self.pending = pending;
        self.summary = state.summary();
        debug!("Walk finished: {}", self.summary);
    }
}

/// Unknown roots are always an error, whatever `fail_on_missing` says.
pub(crate) fn check_roots(graph: &ModuleGraph, roots: &[ModuleIdentity]) -> Result<()> {
    if roots.is_empty() {
        return Err(PendantError::Walk("no root modules given".to_string()));
    }
    if let Some(unknown) = roots.iter().find(|r| !graph.contains(r)) {
        return Err(PendantError::NotFound(format!(
            "root module '{unknown}' is not declared in the graph"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pendant_common::dependency::{DeclaredDependency, EdgeTag, ModuleDescriptor};

    use super::*;

    fn id(name: &str) -> ModuleIdentity {
        ModuleIdentity::new("org", name)
    }

    fn edge(from: &str, to: &str, tags: EdgeTag) -> DependencyEdge {
        DependencyEdge::new(id(from), &DeclaredDependency::with_tags(id(to), tags))
    }

    #[test]
    fn candidate_then_hard_edge_replays_in_order() {
        let state = PendingDependenciesState::new();
        let e1 = edge("a", "m", EdgeTag::CONSTRAINT);
        let e2 = edge("b", "m", EdgeTag::PLATFORM);
        let e3 = edge("c", "m", EdgeTag::empty());

        assert_eq!(classify_edge(&state, e1.clone()), EdgeDecision::Deferred);
        assert_eq!(classify_edge(&state, e2.clone()), EdgeDecision::Deferred);
        assert_eq!(
            classify_edge(&state, e3.clone()),
            EdgeDecision::Activated(vec![e1, e2, e3])
        );
        assert_eq!(state.get_or_create(&id("m")).hard_edges(), 1);
    }

    #[test]
    fn edges_to_active_module_are_accepted_immediately() {
        let state = PendingDependenciesState::new();
        let hard = edge("a", "n", EdgeTag::empty());
        assert_eq!(
            classify_edge(&state, hard.clone()),
            EdgeDecision::Activated(vec![hard])
        );

        let candidate = edge("b", "n", EdgeTag::OPTIONAL);
        assert_eq!(
            classify_edge(&state, candidate.clone()),
            EdgeDecision::Accepted(candidate)
        );
        let second_hard = edge("c", "n", EdgeTag::empty());
        assert_eq!(
            classify_edge(&state, second_hard.clone()),
            EdgeDecision::Accepted(second_hard)
        );
        assert_eq!(state.get_or_create(&id("n")).hard_edges(), 2);
    }

    #[test]
    fn visit_reports_missing_descriptor() {
        let graph = ModuleGraph::default();
        let state = PendingDependenciesState::new();
        let report = visit_module(&graph, &state, id("ghost"));
        assert!(report.missing);
        assert!(report.accepted.is_empty());
    }

    #[test]
    fn visit_collects_activations() {
        let mut graph = ModuleGraph::default();
        graph.insert(ModuleDescriptor {
            id: id("root"),
            version: None,
            dependencies: vec![
                DeclaredDependency::with_tags(id("x"), EdgeTag::CONSTRAINT),
                DeclaredDependency::hard(id("y")),
                DeclaredDependency::hard(id("x")),
            ],
        });
        let state = PendingDependenciesState::new();
        let report = visit_module(&graph, &state, id("root"));
        assert!(!report.missing);
        assert_eq!(report.activated, vec![id("y"), id("x")]);
        let targets: Vec<_> = report.accepted.iter().map(|e| e.to.clone()).collect();
        assert_eq!(targets, vec![id("y"), id("x"), id("x")]);
    }

    #[test]
    fn absorb_fails_on_missing_when_asked() {
        let report = VisitReport {
            missing: true,
            ..VisitReport::new(id("ghost"))
        };
        let mut outcome = WalkOutcome::default();
        assert!(matches!(
            outcome.absorb(report.clone(), true),
            Err(PendantError::NotFound(_))
        ));
        outcome.absorb(report, false).unwrap();
        assert!(outcome.missing.contains(&id("ghost")));
        assert!(outcome.is_activated(&id("ghost")));
    }

    #[test]
    fn check_roots_rejects_empty_and_unknown() {
        let graph = ModuleGraph::default();
        assert!(matches!(check_roots(&graph, &[]), Err(PendantError::Walk(_))));
        assert!(matches!(
            check_roots(&graph, &[id("nope")]),
            Err(PendantError::NotFound(_))
        ));
    }
}
