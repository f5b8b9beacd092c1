// pendant-common/src/config.rs
use std::env;

use tracing::debug;

use super::error::{PendantError, Result};

const WORKERS_VAR: &str = "PENDANT_WORKERS";
const PARALLEL_VAR: &str = "PENDANT_PARALLEL";
const FAIL_ON_MISSING_VAR: &str = "PENDANT_FAIL_ON_MISSING";
const MAX_DEFAULT_WORKERS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
    pub workers: usize,
    pub parallel: bool,
    /// Treat a dependency on a module absent from the graph as fatal.
    pub fail_on_missing: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            parallel: false,
            fail_on_missing: false,
        }
    }
}

impl WalkConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading pendant walk configuration");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `load` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(WORKERS_VAR).filter(|s| !s.trim().is_empty()) {
            config.workers = match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(PendantError::Config(format!(
                        "{WORKERS_VAR} must be at least 1"
                    )))
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(PendantError::Config(format!(
                        "{WORKERS_VAR}='{raw}' is not a worker count: {e}"
                    )))
                }
            };
        }
        if let Some(raw) = lookup(PARALLEL_VAR) {
            config.parallel = parse_flag(PARALLEL_VAR, &raw)?;
        }
        if let Some(raw) = lookup(FAIL_ON_MISSING_VAR) {
            config.fail_on_missing = parse_flag(FAIL_ON_MISSING_VAR, &raw)?;
        }

        debug!("Walk configuration: {:?}", config);
        Ok(config)
    }
}

pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get_physical().saturating_sub(1)).min(MAX_DEFAULT_WORKERS)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(PendantError::Config(format!(
            "{key}='{other}' is not a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = WalkConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WalkConfig::default());
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&config.workers));
    }

    #[test]
    fn reads_overrides() {
        let config = WalkConfig::from_lookup(lookup(&[
            (WORKERS_VAR, "3"),
            (PARALLEL_VAR, "true"),
            (FAIL_ON_MISSING_VAR, "1"),
        ]))
        .unwrap();
        assert_eq!(config.workers, 3);
        assert!(config.parallel);
        assert!(config.fail_on_missing);
    }

    #[test]
    fn rejects_bad_values() {
        for pairs in [
            [(WORKERS_VAR, "0")],
            [(WORKERS_VAR, "many")],
            [(PARALLEL_VAR, "maybe")],
        ] {
            let err = WalkConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, PendantError::Config(_)), "{err}");
        }
    }
}
