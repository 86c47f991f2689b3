use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use tracing::info;

use janitor_orchestrator::listing::list_executions;
use janitor_orchestrator::{CleanupConfig, Execution, RundeckClient};

pub async fn run(config: &CleanupConfig) -> Result<()> {
    let api = RundeckClient::from_config(config).context("Failed to create Rundeck client")?;
    let filter = config.listing_filter();

    let listed = list_executions(&api, &filter).await?;
    let mut total = 0;
    for (project, executions) in &listed {
        for execution in executions {
            println!("{}", describe(project, execution));
        }
        total += executions.len();
    }

    info!(
        projects = listed.len(),
        executions = total,
        only_running = filter.only_running,
        "Listed {} executions",
        total
    );
    Ok(())
}

fn describe(project: &str, execution: &Execution) -> String {
    let mut line = format!(
        "[{}] - Job '{}' is {}",
        project,
        execution.job_name().unwrap_or("<adhoc>"),
        status_colored(&execution.status)
    );
    if let Some(at) = execution.finished_at() {
        line.push_str(&format!(" ({})", format_elapsed(at).dimmed()));
    }
    line
}

fn status_colored(status: &str) -> String {
    match status {
        "succeeded" => status.green().to_string(),
        "failed" | "failed-with-retry" | "timedout" => status.red().to_string(),
        "running" => status.yellow().to_string(),
        "aborted" | "scheduled" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

fn format_elapsed(at: DateTime<Utc>) -> String {
    chrono_humanize::HumanTime::from(at).to_string()
}
