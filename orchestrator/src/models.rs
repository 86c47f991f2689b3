use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unit of cleanup work: a whole project, or one job inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
  Project(String),
  Job { project: String, id: String },
}

impl Scope {
  pub fn project(&self) -> &str {
    match self {
      Scope::Project(name) => name,
      Scope::Job { project, .. } => project,
    }
  }

  /// Path of the executions listing for this scope, relative to the API root.
  pub fn executions_endpoint(&self) -> String {
    match self {
      Scope::Project(name) => format!("project/{}/executions", urlencoding::encode(name)),
      Scope::Job { id, .. } => format!("job/{}/executions", urlencoding::encode(id)),
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Project(name) => write!(f, "[{}]", name),
      Scope::Job { project, id } => write!(f, "[{}/{}]", project, id),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateStamp {
  /// Milliseconds since the epoch.
  pub unixtime: i64,
}

impl DateStamp {
  pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(self.unixtime).single()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
  #[serde(default)]
  pub id: Option<String>,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
  pub id: i64,
  pub status: String,
  #[serde(default)]
  pub project: Option<String>,
  #[serde(default)]
  pub job: Option<JobRef>,
  #[serde(rename = "date-started", default)]
  pub date_started: Option<DateStamp>,
  #[serde(rename = "date-ended", default)]
  pub date_ended: Option<DateStamp>,
}

impl Execution {
  pub fn is_running(&self) -> bool {
    self.status == "running"
  }

  /// When the execution finished, or started if it never reported an end.
  pub fn finished_at(&self) -> Option<DateTime<Utc>> {
    self.date_ended
      .as_ref()
      .or(self.date_started.as_ref())
      .and_then(DateStamp::to_datetime)
  }

  /// Eligible for deletion: not running and older than `cutoff`. Executions
  /// without timestamps are trusted to match the server-side age filter.
  pub fn is_deletable(&self, cutoff: DateTime<Utc>) -> bool {
    !self.is_running() && self.finished_at().map_or(true, |at| at < cutoff)
  }

  pub fn job_name(&self) -> Option<&str> {
    self.job.as_ref().map(|job| job.name.as_str())
  }
}

/// Body returned by `POST /executions/delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
  #[serde(rename = "allsuccessful")]
  pub all_successful: bool,
  #[serde(rename = "successCount", default)]
  pub success_count: u64,
  #[serde(rename = "failedCount", default)]
  pub failed_count: u64,
  #[serde(rename = "requestCount", default)]
  pub request_count: u64,
}

/// Workflow rows referenced by a set of executions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowRefs {
  pub workflow_ids: BTreeSet<i64>,
  pub workflow_step_ids: BTreeSet<i64>,
}

impl WorkflowRefs {
  pub fn is_empty(&self) -> bool {
    self.workflow_ids.is_empty() && self.workflow_step_ids.is_empty()
  }

  pub fn merge(&mut self, other: WorkflowRefs) {
    self.workflow_ids.extend(other.workflow_ids);
    self.workflow_step_ids.extend(other.workflow_step_ids);
  }
}

/// Workflow rows no live execution or schedule points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanSet {
  pub workflow_ids: Vec<i64>,
  pub workflow_step_ids: Vec<i64>,
  /// Orphan workflow ids that still own join rows. Only collected in
  /// unoptimized mode; when present the join rows are deleted first.
  pub join_workflow_ids: Option<Vec<i64>>,
}

impl OrphanSet {
  pub fn is_empty(&self) -> bool {
    self.workflow_ids.is_empty() && self.workflow_step_ids.is_empty()
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletedRows {
  pub join_rows: u64,
  pub workflow_steps: u64,
  pub workflows: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
  pub scopes: u64,
  pub executions_deleted: u64,
  pub workflows_deleted: u64,
  pub workflow_steps_deleted: u64,
  pub orphan_workflows_deleted: u64,
  pub orphan_workflow_steps_deleted: u64,
}
