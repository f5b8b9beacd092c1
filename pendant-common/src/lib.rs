// pendant-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod model;

// Re-export key types
pub use config::WalkConfig;
pub use dependency::{DeclaredDependency, DependencyEdge, EdgeTag, ModuleGraph};
pub use error::{PendantError, Result};
pub use model::ModuleIdentity;
