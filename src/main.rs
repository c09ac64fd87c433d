mod cli;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cabchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    telemetry::init_tracing(cli.verbose, cli.log_json || config.logging.json)?;
    info!(version = env!("CARGO_PKG_VERSION"), "cabchat starting");

    cli::run(cli.command(), config).await
}
