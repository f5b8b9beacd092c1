use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use pendant_common::config::WalkConfig;
use pendant_common::dependency::ModuleGraph;
use pendant_common::error::{PendantError, Result};
use pendant_common::model::ModuleIdentity;
use threadpool::ThreadPool;
use tracing::{debug, instrument, trace};

use super::{check_roots, visit_module, VisitReport, WalkOutcome};
use crate::pending::PendingDependenciesState;

const PANIC_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Walker that visits modules on a worker pool.
///
/// The manager thread owns the outcome; workers only touch the shared
/// registry and send a [`VisitReport`] back. The resolved module set and the
/// edges accepted for each module match [`GraphWalker`](super::GraphWalker),
/// the visit order does not.
pub struct ParallelWalker {
    graph: Arc<ModuleGraph>,
    config: WalkConfig,
}

impl ParallelWalker {
    pub fn new(graph: Arc<ModuleGraph>, config: WalkConfig) -> Self {
        Self { graph, config }
    }

    #[instrument(skip_all, name = "parallel_walk_manager", fields(roots = roots.len()))]
    pub fn walk(&self, roots: &[ModuleIdentity]) -> Result<WalkOutcome> {
        check_roots(&self.graph, roots)?;

        let num_workers = self.config.workers.max(1);
        let pool = ThreadPool::new(num_workers);
        let state = Arc::new(PendingDependenciesState::new());
        let (report_tx, report_rx) = crossbeam_channel::unbounded::<VisitReport>();
        debug!("Parallel walk started with {} workers.", num_workers);

        let submit = |module: ModuleIdentity| {
            let graph = Arc::clone(&self.graph);
            let state = Arc::clone(&state);
            let report_tx = report_tx.clone();
            trace!("[{}] Submitting visit to worker pool.", module);
            pool.execute(move || {
                let report = visit_module(&graph, &state, module);
                // The manager only stops listening after an error, at which
                // point the report is no longer wanted.
                let _ = report_tx.send(report);
            });
        };

        let mut outstanding = 0usize;
        for root in roots {
            if state.activate_if_pending(root).is_some() {
                submit(root.clone());
                outstanding += 1;
            }
        }

        let mut outcome = WalkOutcome::default();
        while outstanding > 0 {
            let report = match report_rx.recv_timeout(PANIC_CHECK_INTERVAL) {
                Ok(report) => report,
                Err(RecvTimeoutError::Timeout) => {
                    if pool.panic_count() > 0 {
                        return Err(PendantError::Walk(format!(
                            "{} walker worker(s) panicked",
                            pool.panic_count()
                        )));
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(PendantError::Walk(
                        "walker report channel closed unexpectedly".to_string(),
                    ))
                }
            };
            outstanding -= 1;

            for target in &report.activated {
                submit(target.clone());
                outstanding += 1;
            }
            outcome.absorb(report, self.config.fail_on_missing)?;
        }

        pool.join();
        outcome.finish(&state);
        debug!(
            "Parallel walk visited {} modules",
            outcome.visit_order.len()
        );
        Ok(outcome)
    }
}
