//! Command implementations

mod config;
mod extract;
mod inspect;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Extract(args) => extract::execute(args, config_path, &output),
        Commands::Inspect(args) => inspect::execute(args, config_path, &output),
        Commands::Config => config::execute(config_path, &output),
    }
}
