use std::collections::VecDeque;

use pendant_common::config::WalkConfig;
use pendant_common::dependency::ModuleGraph;
use pendant_common::error::Result;
use pendant_common::model::ModuleIdentity;
use tracing::{debug, instrument};

use super::{check_roots, visit_module, WalkOutcome};
use crate::pending::PendingDependenciesState;

/// Single-threaded breadth-first walker. For a fixed graph the visit order
/// and the order of every module's incoming edges are deterministic.
pub struct GraphWalker<'a> {
    graph: &'a ModuleGraph,
    config: &'a WalkConfig,
    state: PendingDependenciesState,
}

impl<'a> GraphWalker<'a> {
    pub fn new(graph: &'a ModuleGraph, config: &'a WalkConfig) -> Self {
        Self {
            graph,
            config,
            state: PendingDependenciesState::new(),
        }
    }

    /// Walks from `roots`. The pending registry lives exactly as long as
    /// this call.
    #[instrument(skip_all, name = "graph_walk", fields(roots = roots.len()))]
    pub fn walk(self, roots: &[ModuleIdentity]) -> Result<WalkOutcome> {
        check_roots(self.graph, roots)?;

        let mut queue = VecDeque::new();
        for root in roots {
            if self.state.activate_if_pending(root).is_some() {
                queue.push_back(root.clone());
            }
        }

        let mut outcome = WalkOutcome::default();
        while let Some(module) = queue.pop_front() {
            let report = visit_module(self.graph, &self.state, module);
            queue.extend(report.activated.iter().cloned());
            outcome.absorb(report, self.config.fail_on_missing)?;
        }

        outcome.finish(&self.state);
        debug!(
            "Sequential walk visited {} modules",
            outcome.visit_order.len()
        );
        Ok(outcome)
    }
}
