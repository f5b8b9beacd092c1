// pendant/src/cli.rs
//! Defines the command-line argument structure using clap.
use clap::{ArgAction, Parser, Subcommand};
use pendant_common::error::Result;

pub mod check;
pub mod walk;

use crate::cli::check::Check;
use crate::cli::walk::Walk;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "pendant", bin_name = "pendant")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Walk(Walk),
    Check(Check),
}

impl Command {
    pub fn run(&self) -> Result<()> {
        match self {
            Self::Walk(command) => command.run(),
            Self::Check(command) => command.run(),
        }
    }
}
