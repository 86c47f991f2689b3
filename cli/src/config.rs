use std::time::Duration;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use janitor_orchestrator::config::{ApiConfig, DatabaseConfig};
use janitor_orchestrator::{CleanupConfig, ExecutionMode, KeepTime};

#[derive(Parser, Debug)]
#[command(name = "janitor", version)]
#[command(about = "Delete old Rundeck executions together with their workflow rows")]
pub struct Cli {
    /// Rundeck API token
    #[arg(short = 'a', long = "auth", env = "RUNDECK_TOKEN", hide_env_values = true)]
    pub auth: String,

    #[arg(short = 't', long, env = "RUNDECK_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(
        short = 'p',
        long,
        env = "RUNDECK_PORT",
        default_value_t = 4440,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    #[arg(long, default_value_t = 19)]
    pub api_version: u32,

    /// Timeout for listing calls, in seconds
    #[arg(long, default_value_t = 60)]
    pub search_timeout: u64,

    /// Timeout for the bulk delete call, in seconds
    #[arg(long, default_value_t = 300)]
    pub delete_timeout: u64,

    /// Retention window: <number><h|d|w|m|y>
    #[arg(long, default_value = "30d")]
    pub keep_time: KeepTime,

    #[arg(long, default_value_t = 200)]
    pub chunk_size: u64,

    /// Total attempts per page and per orphan sweep
    #[arg(long, default_value_t = 5)]
    pub retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, default_value_t = 5)]
    pub retry_delay: u64,

    #[arg(long)]
    pub ssl_enabled: bool,

    #[arg(long)]
    pub filtered_project: Option<String>,

    /// Job id to clean (requires --filtered-project)
    #[arg(long)]
    pub filtered_job: Option<String>,

    #[arg(short = 'm', long, default_value = "cleanup")]
    pub execution_mode: ExecutionMode,

    /// Page through whole projects; false cleans job by job
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub executions_by_project: bool,

    /// Delete workflow/step join rows explicitly
    #[arg(long)]
    pub unoptimized: bool,

    #[arg(long)]
    pub debug: bool,

    #[arg(long, env = "DATASOURCE_HOST", default_value = "mysql-host")]
    pub db_host: String,

    #[arg(long, env = "DATASOURCE_PORT", default_value_t = 3306)]
    pub db_port: u16,

    #[arg(long, env = "DATASOURCE_DBNAME", default_value = "rundeck")]
    pub db_name: String,

    #[arg(long, env = "DATASOURCE_USER", default_value = "rundeck")]
    pub db_user: String,

    #[arg(long, env = "DATASOURCE_PASSWORD", hide_env_values = true)]
    pub db_pass: Option<String>,

    /// Full connection URL; overrides the --db-* parts
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub db_url: Option<String>,

    /// Listing mode: only executions of this job name
    #[arg(long)]
    pub job_name: Option<String>,

    /// Listing mode: only running executions
    #[arg(long)]
    pub only_running: bool,
}

impl Cli {
    /// Build and validate the run configuration.
    pub fn into_config(self) -> Result<CleanupConfig> {
        let database = match (self.db_url, self.db_pass) {
            (Some(url), _) => DatabaseConfig { url },
            (None, Some(password)) => DatabaseConfig::from_parts(
                &self.db_host,
                self.db_port,
                &self.db_name,
                &self.db_user,
                &password,
            ),
            (None, None) if self.execution_mode == ExecutionMode::Listing => DatabaseConfig {
                url: String::new(),
            },
            (None, None) => bail!("Missing database password."),
        };

        let config = CleanupConfig {
            api: ApiConfig {
                host: self.host,
                port: self.port,
                auth_token: self.auth,
                api_version: self.api_version,
                ssl_enabled: self.ssl_enabled,
                search_timeout: Duration::from_secs(self.search_timeout),
                delete_timeout: Duration::from_secs(self.delete_timeout),
            },
            database,
            keep_time: self.keep_time,
            chunk_size: self.chunk_size,
            retries: self.retries,
            retry_delay: Duration::from_secs(self.retry_delay),
            filtered_project: self.filtered_project,
            filtered_job: self.filtered_job,
            execution_mode: self.execution_mode,
            executions_by_project: self.executions_by_project,
            unoptimized: self.unoptimized,
            job_name: self.job_name,
            only_running: self.only_running,
            debug: self.debug,
        };
        config.validate()?;
        Ok(config)
    }
}
