use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, info};

use janitor_orchestrator::{CleanupConfig, Database, Orchestrator, RundeckClient};

use crate::interrupt::PromptingInterrupt;

pub async fn run(config: &CleanupConfig) -> Result<()> {
    let api = RundeckClient::from_config(config).context("Failed to create Rundeck client")?;
    let db = Database::from_config(&config.database);

    info!(
        api = api.gateway().base_url(),
        database = ?config.database,
        keep_time = %config.keep_time,
        chunk_size = config.chunk_size,
        retries = config.retries,
        "Starting cleanup of executions older than {}",
        config.keep_time
    );

    let guard = PromptingInterrupt::install()?;
    let orchestrator =
        Orchestrator::new(api, db, config.chunk_size, config.keep_time).with_interrupt_guard(guard);

    let summary = orchestrator.clean(&config.cleanup_options()).await?;
    debug!(summary = %serde_json::to_string(&summary)?, "Cleanup summary");

    println!("{}: {}", "Executions deleted".bold(), summary.executions_deleted);
    println!(
        "{}: {} ({} steps)",
        "Workflows deleted".bold(),
        summary.workflows_deleted,
        summary.workflow_steps_deleted
    );
    println!(
        "{}: {} ({} steps)",
        "Orphaned workflows deleted".bold(),
        summary.orphan_workflows_deleted,
        summary.orphan_workflow_steps_deleted
    );
    Ok(())
}
