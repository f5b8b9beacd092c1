// pendant-common/src/dependency/graph.rs
//! Serializable module graph the walker runs over.
//!
//! Stands in for resolved module metadata: every module lists the
//! dependencies it declares, in declaration order.
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::definition::DeclaredDependency;
use crate::error::Result;
use crate::model::ModuleIdentity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub id: ModuleIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default)]
    pub dependencies: Vec<DeclaredDependency>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    #[serde(default)]
    pub roots: Vec<ModuleIdentity>,
}

/// Problems found by [`ModuleGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    DuplicateModule(ModuleIdentity),
    UndeclaredReference {
        from: ModuleIdentity,
        to: ModuleIdentity,
    },
    UnknownRoot(ModuleIdentity),
    SelfReference(ModuleIdentity),
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateModule(id) => write!(f, "module '{id}' is declared more than once"),
            Self::UndeclaredReference { from, to } => {
                write!(f, "'{from}' depends on undeclared module '{to}'")
            }
            Self::UnknownRoot(id) => write!(f, "root '{id}' is not declared"),
            Self::SelfReference(id) => write!(f, "module '{id}' depends on itself"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: HashMap<ModuleIdentity, ModuleDescriptor>,
    roots: Vec<ModuleIdentity>,
    duplicates: Vec<ModuleIdentity>,
}

impl ModuleGraph {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading module graph from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(raw)?;
        Ok(Self::from_document(document))
    }

    /// Later duplicates win; they are remembered for [`validate`](Self::validate).
    pub fn from_document(document: GraphDocument) -> Self {
        let mut modules = HashMap::with_capacity(document.modules.len());
        let mut duplicates = Vec::new();
        for descriptor in document.modules {
            let id = descriptor.id.clone();
            if modules.insert(id.clone(), descriptor).is_some() {
                duplicates.push(id);
            }
        }
        debug!(
            "Module graph holds {} modules and {} roots",
            modules.len(),
            document.roots.len()
        );
        Self {
            modules,
            roots: document.roots,
            duplicates,
        }
    }

    pub fn insert(&mut self, descriptor: ModuleDescriptor) {
        let id = descriptor.id.clone();
        if self.modules.insert(id.clone(), descriptor).is_some() {
            self.duplicates.push(id);
        }
    }

    pub fn add_root(&mut self, root: ModuleIdentity) {
        self.roots.push(root);
    }

    pub fn get(&self, id: &ModuleIdentity) -> Option<&ModuleDescriptor> {
        self.modules.get(id)
    }

    pub fn contains(&self, id: &ModuleIdentity) -> bool {
        self.modules.contains_key(id)
    }

    pub fn dependencies_of(&self, id: &ModuleIdentity) -> Option<&[DeclaredDependency]> {
        self.modules.get(id).map(|m| m.dependencies.as_slice())
    }

    pub fn roots(&self) -> &[ModuleIdentity] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module_ids(&self) -> BTreeSet<&ModuleIdentity> {
        self.modules.keys().collect()
    }

    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues: Vec<GraphIssue> = self
            .duplicates
            .iter()
            .cloned()
            .map(GraphIssue::DuplicateModule)
            .collect();

        let mut seen_refs = HashSet::new();
        for id in self.module_ids() {
            for dep in &self.modules[id].dependencies {
                if &dep.module == id {
                    issues.push(GraphIssue::SelfReference(id.clone()));
                } else if !self.modules.contains_key(&dep.module)
                    && seen_refs.insert((id.clone(), dep.module.clone()))
                {
                    issues.push(GraphIssue::UndeclaredReference {
                        from: id.clone(),
                        to: dep.module.clone(),
                    });
                }
            }
        }

        for root in &self.roots {
            if !self.modules.contains_key(root) {
                issues.push(GraphIssue::UnknownRoot(root.clone()));
            }
        }
        issues
    }
}
