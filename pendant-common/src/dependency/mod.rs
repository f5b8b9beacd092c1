pub mod definition;
pub mod graph;

pub use definition::{DeclaredDependency, DependencyEdge, EdgeTag};
pub use graph::{GraphDocument, GraphIssue, ModuleDescriptor, ModuleGraph};
