use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PendantError;

/// Coordinates of a module in the graph: `group:name`.
///
/// Only used as a key, so it carries no version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleIdentity {
    group: String,
    name: String,
}

impl ModuleIdentity {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleIdentity {
    type Err = PendantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, name) = s.trim().split_once(':').ok_or_else(|| {
            PendantError::ParseError("module identity", format!("'{s}' is not 'group:name'"))
        })?;
        if group.is_empty() || name.is_empty() || name.contains(':') {
            return Err(PendantError::ParseError(
                "module identity",
                format!("'{s}' is not 'group:name'"),
            ));
        }
        Ok(Self::new(group, name))
    }
}

impl TryFrom<String> for ModuleIdentity {
    type Error = PendantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleIdentity> for String {
    fn from(id: ModuleIdentity) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_and_name() {
        let id: ModuleIdentity = "org.example:core".parse().unwrap();
        assert_eq!(id.group(), "org.example");
        assert_eq!(id.name(), "core");
        assert_eq!(id.to_string(), "org.example:core");
    }

    #[test]
    fn rejects_malformed_identities() {
        for bad in ["core", ":core", "org.example:", "a:b:c", ""] {
            let err = bad.parse::<ModuleIdentity>().unwrap_err();
            assert!(
                matches!(err, PendantError::ParseError("module identity", _)),
                "unexpected error for {bad:?}: {err}"
            );
        }
    }

    #[test]
    fn serializes_as_coordinate_string() {
        let id = ModuleIdentity::new("org.example", "core");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org.example:core\"");
        let back: ModuleIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ModuleIdentity>("\"nocolon\"").is_err());
    }
}
