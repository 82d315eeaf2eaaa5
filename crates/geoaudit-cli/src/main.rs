//! geoaudit CLI - Command-line interface
//!
//! Batch geometry auditor for folders of shapefiles.

mod cli;
mod commands;
mod config_loader;
mod dry_run;
mod errors;
mod feedback;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize tracing; logs go to stderr so stdout stays parseable with --json
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(error) = commands::execute(cli) {
        errors::from_anyhow(error).display();
        std::process::exit(1);
    }
}
