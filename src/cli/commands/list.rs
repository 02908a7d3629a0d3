//! List command implementation for crab-party
//!
//! Discovers and displays the DLNA renderers a session can play on.

use crate::{devices::Render, error::Result};
use log::info;

/// List command implementation
pub struct ListCommand<'a> {
    _args: &'a super::super::List,
}

impl<'a> ListCommand<'a> {
    pub fn new(args: &'a super::super::List) -> Self {
        Self { _args: args }
    }

    pub async fn run(&self, discovery_timeout: u64) -> Result<()> {
        info!("List devices");
        let renders = Render::discover(discovery_timeout).await?;
        if renders.is_empty() {
            println!("No renderer found, try a longer --timeout");
        }
        for render in renders {
            println!("{render}");
        }
        Ok(())
    }
}
