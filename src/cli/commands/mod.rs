//! CLI command implementations for crab-party
//!
//! This module contains the implementation of the join, probe and list commands.

mod join;
mod list;
mod probe;

pub use join::JoinCommand;
pub use list::ListCommand;
pub use probe::ProbeCommand;

use crate::{config::LOG_LEVEL_ENV_VAR, error::Result};
use clap::Subcommand;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::env;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Join a room and keep playback in sync with it
    Join(super::Join),

    /// Show how a source would be loaded
    Probe(super::Probe),

    /// Scan and list DLNA renderers in the network
    List(super::List),
}

impl Commands {
    /// Execute the command
    pub async fn run(&self, cli: &super::Cli) -> Result<()> {
        setup_log(cli.log_level);
        match self {
            Self::Join(join) => JoinCommand::new(join).run(cli).await,
            Self::Probe(probe) => ProbeCommand::new(probe).run().await,
            Self::List(list) => ListCommand::new(list).run(cli.timeout).await,
        }
    }
}

/// The environment variable wins over the command line
fn setup_log(cli_level: LevelFilter) {
    let log_level = env::var(LOG_LEVEL_ENV_VAR)
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(cli_level);

    SimpleLogger::new()
        .with_level(log_level)
        .init()
        .unwrap_or_else(|_| eprintln!("Warning: Logger already initialized"));
}
