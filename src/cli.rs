//! Command line interface for crab-party

mod args;
mod commands;

pub use args::{Cli, Join, List, Probe};
pub use commands::Commands;

use crate::error::Result;
use clap::Parser;

/// Parses the command line and runs the selected command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.command.run(&cli).await
}
