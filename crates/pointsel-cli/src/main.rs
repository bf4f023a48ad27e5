//! pointsel CLI - Command-line interface
//!
//! Selects the points lying in a named polygon and writes their attributes as CSV.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;

fn main() {
    // Logs go to stderr so CSV written to stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(error) = commands::execute(cli) {
        let code = errors::exit_code(&error);
        errors::from_anyhow(error).display();
        std::process::exit(code);
    }
}
