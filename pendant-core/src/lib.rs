// pendant-core/src/lib.rs
//! Pending-dependency activation for dependency graph resolution.
//!
//! Modules reached only through candidate edges (constraints, platform
//! alignment, optional declarations) stay pending and their own
//! dependencies are not walked. The first unconditional edge activates the
//! module and replays every candidate edge deferred for it, once, in
//! discovery order.

pub mod pending;
pub mod walker;

// Re-export key types for easier use by the CLI crate
pub use pending::{Deferral, PendingDependenciesState, PendingRecord, PendingState, PendingSummary};
pub use walker::{GraphWalker, ParallelWalker, WalkOutcome};
