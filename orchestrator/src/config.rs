// Validated runtime configuration, built once at startup and passed by reference
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cleanup::{CleanupOptions, ScopeFilter};
use crate::error::{CleanupError, Result};
use crate::listing::ListingFilter;

/// The bulk delete endpoint (`POST /executions/delete`) appeared in API v12.
pub const MIN_API_VERSION: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
  Hours,
  Days,
  Weeks,
  Months,
  Years,
}

impl TimeUnit {
  fn suffix(self) -> char {
    match self {
      TimeUnit::Hours => 'h',
      TimeUnit::Days => 'd',
      TimeUnit::Weeks => 'w',
      TimeUnit::Months => 'm',
      TimeUnit::Years => 'y',
    }
  }

  fn hours(self) -> i64 {
    match self {
      TimeUnit::Hours => 1,
      TimeUnit::Days => 24,
      TimeUnit::Weeks => 24 * 7,
      TimeUnit::Months => 24 * 30,
      TimeUnit::Years => 24 * 365,
    }
  }
}

/// Retention window in Rundeck's `olderFilter` notation, e.g. `30d` or `12h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepTime {
  pub amount: u32,
  pub unit: TimeUnit,
}

impl KeepTime {
  pub fn as_duration(&self) -> chrono::Duration {
    chrono::Duration::try_hours(i64::from(self.amount) * self.unit.hours())
      .unwrap_or(chrono::Duration::MAX)
  }

  /// Executions that finished before this instant are eligible for deletion.
  pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(self.as_duration())
      .unwrap_or(DateTime::<Utc>::MIN_UTC)
  }
}

impl FromStr for KeepTime {
  type Err = CleanupError;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || CleanupError::Validation(format!("Invalid time to keep old records: '{}'", s));

    let s = s.trim();
    let unit = match s.chars().last() {
      Some('h') => TimeUnit::Hours,
      Some('d') => TimeUnit::Days,
      Some('w') => TimeUnit::Weeks,
      Some('m') => TimeUnit::Months,
      Some('y') => TimeUnit::Years,
      _ => return Err(invalid()),
    };

    let digits = &s[..s.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    let amount: u32 = digits.parse().map_err(|_| invalid())?;
    if amount == 0 || chrono::Duration::try_hours(i64::from(amount) * unit.hours()).is_none() {
      return Err(invalid());
    }

    Ok(KeepTime { amount, unit })
  }
}

impl fmt::Display for KeepTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.amount, self.unit.suffix())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
  #[default]
  Cleanup,
  Listing,
}

impl FromStr for ExecutionMode {
  type Err = CleanupError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "cleanup" => Ok(ExecutionMode::Cleanup),
      "listing" => Ok(ExecutionMode::Listing),
      other => Err(CleanupError::Validation(format!(
        "No execution mode matching '{}' (expected cleanup or listing)",
        other
      ))),
    }
  }
}

impl fmt::Display for ExecutionMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExecutionMode::Cleanup => f.write_str("cleanup"),
      ExecutionMode::Listing => f.write_str("listing"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub host: String,
  pub port: u16,
  pub auth_token: String,
  pub api_version: u32,
  pub ssl_enabled: bool,
  pub search_timeout: Duration,
  pub delete_timeout: Duration,
}

impl ApiConfig {
  pub fn base_url(&self) -> String {
    let protocol = if self.ssl_enabled { "https" } else { "http" };
    format!(
      "{}://{}:{}/api/{}",
      protocol, self.host, self.port, self.api_version
    )
  }
}

#[derive(Clone)]
pub struct DatabaseConfig {
  pub url: String,
}

impl DatabaseConfig {
  /// Build a MySQL connection URL from discrete settings.
  pub fn from_parts(host: &str, port: u16, name: &str, user: &str, password: &str) -> Self {
    Self {
      url: format!(
        "mysql://{}:{}@{}:{}/{}",
        urlencoding::encode(user),
        urlencoding::encode(password),
        host,
        port,
        name
      ),
    }
  }
}

// Keeps the password out of debug logs
impl fmt::Debug for DatabaseConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let redacted = match (self.url.find("://"), self.url.rfind('@')) {
      (Some(scheme_end), Some(at)) if at > scheme_end => {
        format!("{}://***@{}", &self.url[..scheme_end], &self.url[at + 1..])
      }
      _ => self.url.clone(),
    };
    f.debug_struct("DatabaseConfig").field("url", &redacted).finish()
  }
}

#[derive(Debug, Clone)]
pub struct CleanupConfig {
  pub api: ApiConfig,
  pub database: DatabaseConfig,
  pub keep_time: KeepTime,
  pub chunk_size: u64,
  pub retries: u32,
  pub retry_delay: Duration,
  pub filtered_project: Option<String>,
  pub filtered_job: Option<String>,
  pub execution_mode: ExecutionMode,
  pub executions_by_project: bool,
  pub unoptimized: bool,
  pub job_name: Option<String>,
  pub only_running: bool,
  pub debug: bool,
}

impl CleanupConfig {
  /// Reject settings that would make any later step misbehave. Runs before
  /// any scope is touched.
  pub fn validate(&self) -> Result<()> {
    if self.api.auth_token.trim().is_empty() {
      return Err(CleanupError::Validation("Missing API token.".into()));
    }
    if self.api.port == 0 {
      return Err(CleanupError::Validation("Invalid port number.".into()));
    }
    if self.api.api_version < MIN_API_VERSION {
      return Err(CleanupError::Validation(format!(
        "Invalid API version {} (bulk deletion requires {} or newer).",
        self.api.api_version, MIN_API_VERSION
      )));
    }
    if self.api.search_timeout.is_zero() {
      return Err(CleanupError::Validation(
        "Invalid searching timeout value.".into(),
      ));
    }
    if self.api.delete_timeout.is_zero() {
      return Err(CleanupError::Validation(
        "Invalid deleting timeout value.".into(),
      ));
    }
    if self.chunk_size == 0 {
      return Err(CleanupError::Validation("Invalid chunk size value.".into()));
    }
    if self.retries == 0 {
      return Err(CleanupError::Validation(
        "Invalid number of retries (at least one attempt is required).".into(),
      ));
    }
    if self.execution_mode == ExecutionMode::Cleanup && self.database.url.trim().is_empty() {
      return Err(CleanupError::Validation("Missing database URL.".into()));
    }
    if self.filtered_job.is_some() && self.filtered_project.is_none() {
      return Err(CleanupError::Validation(
        "A filtered job also needs its filtered project.".into(),
      ));
    }
    Ok(())
  }

  pub fn cleanup_options(&self) -> CleanupOptions {
    CleanupOptions {
      scope_filter: ScopeFilter {
        project: self.filtered_project.clone(),
        job: self.filtered_job.clone(),
      },
      group_by_project: self.executions_by_project,
      retries: self.retries,
      backoff: self.retry_delay,
      unoptimized: self.unoptimized,
    }
  }

  pub fn listing_filter(&self) -> ListingFilter {
    ListingFilter {
      project: self.filtered_project.clone(),
      job_name: self.job_name.clone(),
      only_running: self.only_running,
    }
  }
}
