use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gr_cli::commands::report;
use gr_cli::{Cli, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Logs go to stderr so stdout stays clean for reports
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_cli(&cli);
    tracing::debug!(?config, "loaded configuration");

    report::run(&cli, &config)
}
