// Rundeck REST API access
pub mod gateway;
pub mod parser;
pub mod rundeck;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DeleteOutcome, Execution, Scope};

pub use gateway::HttpGateway;
pub use rundeck::RundeckClient;

/// Calls the cleanup orchestrator makes against the scheduling platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiClient: Send + Sync {
  /// Names of every project.
  async fn list_projects(&self) -> Result<Vec<String>>;

  /// Ids of every job in `project`.
  async fn list_jobs(&self, project: &str) -> Result<Vec<String>>;

  /// How many executions in `scope` are older than the retention window.
  async fn count_aged_executions(&self, scope: &Scope) -> Result<u64>;

  /// One page of executions older than the retention window, starting at
  /// `offset` in the platform's listing order.
  async fn fetch_aged_executions(&self, scope: &Scope, offset: u64) -> Result<Vec<Execution>>;

  /// Bulk delete. Ids that no longer exist are not an error.
  async fn delete_executions(&self, ids: &[i64]) -> Result<DeleteOutcome>;

  async fn list_executions(&self, project: &str, only_running: bool) -> Result<Vec<Execution>>;
}
