//! Command implementations

mod config;
mod run;
mod scan;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => run::execute(args, &output, cli.dry_run, config_path),
        Commands::Scan(args) => scan::execute(args, &output),
        Commands::Config => config::execute(&output, config_path),
    }
}
