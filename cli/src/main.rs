mod commands;
mod config;
mod interrupt;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use janitor_orchestrator::ExecutionMode;

use crate::config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let level = if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let result = match cli.into_config() {
        Ok(config) => match config.execution_mode {
            ExecutionMode::Cleanup => commands::cleanup::run(&config).await,
            ExecutionMode::Listing => commands::listing::run(&config).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "Exiting without success...");
    }
    result
}
