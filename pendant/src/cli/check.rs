use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use pendant_common::dependency::ModuleGraph;
use pendant_common::error::{PendantError, Result};

#[derive(Args, Debug)]
pub struct Check {
    /// Graph file (JSON)
    pub graph: PathBuf,
}

impl Check {
    pub fn run(&self) -> Result<()> {
        let graph = ModuleGraph::load(&self.graph)?;
        let issues = graph.validate();
        if issues.is_empty() {
            println!(
                "{}",
                format!(
                    "{}: {} modules, {} roots, no issues",
                    self.graph.display(),
                    graph.len(),
                    graph.roots().len()
                )
                .green()
            );
            return Ok(());
        }

        for issue in &issues {
            println!("{} {}", "warning:".yellow().bold(), issue);
        }
        Err(PendantError::Graph(format!(
            "{} issue(s) found in {}",
            issues.len(),
            self.graph.display()
        )))
    }
}
