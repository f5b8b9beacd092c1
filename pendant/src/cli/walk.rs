use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use pendant_common::config::WalkConfig;
use pendant_common::dependency::ModuleGraph;
use pendant_common::error::{PendantError, Result};
use pendant_common::model::ModuleIdentity;
use pendant_core::walker::{GraphWalker, ParallelWalker, WalkOutcome};
use prettytable::{format, Cell, Row, Table};
use tracing::debug;

#[derive(Args, Debug)]
pub struct Walk {
    /// Graph file (JSON)
    pub graph: PathBuf,

    /// Root module to start from; defaults to the roots listed in the graph file
    #[arg(long = "root", value_name = "GROUP:NAME")]
    pub roots: Vec<ModuleIdentity>,

    /// Visit modules on a worker pool
    #[arg(long)]
    pub parallel: bool,

    /// Number of workers for --parallel
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Fail when an activated module is not declared in the graph
    #[arg(long)]
    pub fail_on_missing: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Walk {
    pub fn run(&self) -> Result<()> {
        let loaded = WalkConfig::load().map_err(|e| {
            PendantError::Config(format!("Could not load walk configuration: {e}"))
        })?;
        let config = self.effective_config(&loaded)?;
        let graph = ModuleGraph::load(&self.graph)?;
        let roots = if self.roots.is_empty() {
            graph.roots().to_vec()
        } else {
            self.roots.clone()
        };
        debug!("Walking {} from roots {:?}", self.graph.display(), roots);

        let outcome = if config.parallel {
            ParallelWalker::new(Arc::new(graph.clone()), config.clone()).walk(&roots)?
        } else {
            GraphWalker::new(&graph, &config).walk(&roots)?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_outcome(&graph, &outcome);
        }
        Ok(())
    }

    fn effective_config(&self, config: &WalkConfig) -> Result<WalkConfig> {
        let mut config = config.clone();
        if self.parallel {
            config.parallel = true;
        }
        if self.fail_on_missing {
            config.fail_on_missing = true;
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(PendantError::Config(
                    "--workers must be at least 1".to_string(),
                ));
            }
            config.workers = workers;
        }
        Ok(config)
    }
}

fn print_outcome(graph: &ModuleGraph, outcome: &WalkOutcome) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(Row::new(vec![
        Cell::new("Module").style_spec("b"),
        Cell::new("Version").style_spec("b"),
        Cell::new("Hard").style_spec("b"),
        Cell::new("Candidate").style_spec("b"),
        Cell::new("Required by").style_spec("b"),
    ]));
    for module in &outcome.visit_order {
        let edges = outcome.incoming_to(module);
        let hard = outcome.hard_edges_to(module);
        let version = graph
            .get(module)
            .and_then(|m| m.version.as_ref())
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let mut required_by = edges
            .iter()
            .map(|e| e.from.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let name_cell = if outcome.missing.contains(module) {
            Cell::new(&module.to_string()).style_spec("Fr")
        } else {
            Cell::new(&module.to_string()).style_spec("Fg")
        };
        if required_by.is_empty() {
            required_by.push_str("(root)");
        }
        table.add_row(Row::new(vec![
            name_cell,
            Cell::new(&version),
            Cell::new(&hard.to_string()),
            Cell::new(&edges.len().saturating_sub(hard).to_string()),
            Cell::new(&required_by),
        ]));
    }
    table.printstd();

    if !outcome.pending.is_empty() {
        println!("{}", "Pending (reached only through candidate edges):".yellow());
        for pending in &outcome.pending {
            println!(
                "  {} ({} deferred edge{})",
                pending.module.to_string().yellow(),
                pending.deferred_edges,
                if pending.deferred_edges == 1 { "" } else { "s" }
            );
        }
    }
    if !outcome.missing.is_empty() {
        println!("{}", "Missing from graph:".red().bold());
        for module in &outcome.missing {
            println!("  {}", module.to_string().red());
        }
    }
    println!("{}", outcome.summary.to_string().bold());
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{CliArgs, Command};

    fn parse(args: &[&str]) -> Walk {
        match CliArgs::parse_from(args).command {
            Command::Walk(walk) => walk,
            other => panic!("expected walk, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_loaded_config() {
        let walk = parse(&[
            "pendant", "walk", "graph.json", "--root", "org:app", "--parallel", "--workers", "2",
            "--fail-on-missing",
        ]);
        assert_eq!(walk.roots, vec![ModuleIdentity::new("org", "app")]);
        let config = walk.effective_config(&WalkConfig::default()).unwrap();
        assert!(config.parallel);
        assert!(config.fail_on_missing);
        assert_eq!(config.workers, 2);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let walk = parse(&["pendant", "walk", "graph.json", "--workers", "0"]);
        assert!(matches!(
            walk.effective_config(&WalkConfig::default()),
            Err(PendantError::Config(_))
        ));
    }

    #[test]
    fn malformed_root_is_a_usage_error() {
        let parsed = CliArgs::try_parse_from(["pendant", "walk", "g.json", "--root", "nocolon"]);
        assert!(parsed.is_err());
    }
}
