// Rundeck endpoints used by the cleanup, on top of the HTTP gateway
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::api::parser::extract_as;
use crate::api::{ApiClient, HttpGateway};
use crate::config::{CleanupConfig, KeepTime};
use crate::error::Result;
use crate::models::{DeleteOutcome, Execution, Scope};

pub struct RundeckClient {
  gateway: HttpGateway,
  chunk_size: u64,
  keep_time: KeepTime,
}

impl RundeckClient {
  pub fn new(gateway: HttpGateway, chunk_size: u64, keep_time: KeepTime) -> Self {
    Self {
      gateway,
      chunk_size,
      keep_time,
    }
  }

  pub fn from_config(config: &CleanupConfig) -> Result<Self> {
    Ok(Self::new(
      HttpGateway::from_config(&config.api)?,
      config.chunk_size,
      config.keep_time,
    ))
  }

  pub fn gateway(&self) -> &HttpGateway {
    &self.gateway
  }
}

#[async_trait]
impl ApiClient for RundeckClient {
  async fn list_projects(&self) -> Result<Vec<String>> {
    let payload = self.gateway.get("projects", &[]).await?;
    extract_as(&payload, None, Some("name"))
  }

  async fn list_jobs(&self, project: &str) -> Result<Vec<String>> {
    let endpoint = format!("project/{}/jobs", urlencoding::encode(project));
    let payload = self.gateway.get(&endpoint, &[]).await?;
    extract_as(&payload, None, Some("id"))
  }

  async fn count_aged_executions(&self, scope: &Scope) -> Result<u64> {
    let query = [
      ("olderFilter", self.keep_time.to_string()),
      ("max", "1".to_string()),
    ];
    let payload = self.gateway.get(&scope.executions_endpoint(), &query).await?;
    let total: u64 = extract_as(&payload, Some("paging"), Some("total"))?;
    debug!(scope = %scope, total, keep_time = %self.keep_time, "Counted aged executions");
    Ok(total)
  }

  async fn fetch_aged_executions(&self, scope: &Scope, offset: u64) -> Result<Vec<Execution>> {
    let query = [
      ("max", self.chunk_size.to_string()),
      ("offset", offset.to_string()),
      ("olderFilter", self.keep_time.to_string()),
    ];
    let payload = self.gateway.get(&scope.executions_endpoint(), &query).await?;
    extract_as(&payload, Some("executions"), None)
  }

  async fn delete_executions(&self, ids: &[i64]) -> Result<DeleteOutcome> {
    let payload = self.gateway.post("executions/delete", ids).await?;
    let outcome: DeleteOutcome = extract_as(&payload, None, None)?;

    if outcome.all_successful {
      info!(
        deleted = outcome.success_count,
        "All requested executions were successfully deleted (total of {})",
        outcome.success_count
      );
    } else {
      warn!(
        failed = outcome.failed_count,
        requested = outcome.request_count,
        "Errors on deleting requested executions ({}/{} failed)",
        outcome.failed_count,
        outcome.request_count
      );
    }
    Ok(outcome)
  }

  async fn list_executions(&self, project: &str, only_running: bool) -> Result<Vec<Execution>> {
    let mut endpoint = Scope::Project(project.to_string()).executions_endpoint();
    let mut query = vec![("max", self.chunk_size.to_string())];
    if only_running {
      endpoint.push_str("/running");
    } else {
      query.push(("olderFilter", self.keep_time.to_string()));
    }

    let payload = self.gateway.get(&endpoint, &query).await?;
    extract_as(&payload, Some("executions"), None)
  }
}
