use std::fmt;

use bitflags::bitflags;
use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::model::ModuleIdentity;

bitflags! {
    /// Why an edge exists. Any tag makes the edge a candidate edge; an
    /// untagged edge is a plain, unconditional requirement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EdgeTag: u8 {
        const CONSTRAINT = 0b00000001;
        const PLATFORM   = 0b00000010;
        const OPTIONAL   = 0b00000100;
    }
}

impl Default for EdgeTag {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for EdgeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "hard");
        }
        bitflags::parser::to_writer(self, f)
    }
}

/// A dependency as declared by a module descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    pub module: ModuleIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<VersionReq>,
    #[serde(default)]
    pub tags: EdgeTag,
}

impl DeclaredDependency {
    pub fn hard(module: ModuleIdentity) -> Self {
        Self {
            module,
            selector: None,
            tags: EdgeTag::empty(),
        }
    }

    pub fn with_tags(module: ModuleIdentity, tags: EdgeTag) -> Self {
        Self {
            module,
            selector: None,
            tags,
        }
    }

    pub fn is_candidate(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// An edge discovered while walking: the declaring module plus what it
/// declared. Holds enough to be re-processed after replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ModuleIdentity,
    pub to: ModuleIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<VersionReq>,
    #[serde(default)]
    pub tags: EdgeTag,
}

impl DependencyEdge {
    pub fn new(from: ModuleIdentity, declared: &DeclaredDependency) -> Self {
        Self {
            from,
            to: declared.module.clone(),
            selector: declared.selector.clone(),
            tags: declared.tags,
        }
    }

    pub fn is_candidate(&self) -> bool {
        !self.tags.is_empty()
    }

    pub fn is_unconditional(&self) -> bool {
        self.tags.is_empty()
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)?;
        if let Some(selector) = &self.selector {
            write!(f, " ({selector})")?;
        }
        if self.is_candidate() {
            write!(f, " [{}]", self.tags)?;
        }
        Ok(())
    }
}
