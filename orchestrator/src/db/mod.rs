pub mod orphans;
pub mod workflows;

use async_trait::async_trait;
use sqlx::{AnyConnection, Connection};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{DeletedRows, OrphanSet, WorkflowRefs};

/// Upper bound on ids bound into a single `IN (...)` list.
pub(crate) const BIND_CHUNK: usize = 500;

/// Workflow-table operations the cleanup orchestrator needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DbClient: Send + Sync {
  /// Workflow and workflow-step ids referenced by `execution_ids`.
  async fn resolve_workflows(&self, execution_ids: &[i64]) -> Result<WorkflowRefs>;

  /// Delete the given workflow rows (join rows first when `unoptimized`).
  async fn delete_workflows(&self, refs: &WorkflowRefs, unoptimized: bool) -> Result<DeletedRows>;

  async fn find_orphans(&self, unoptimized: bool) -> Result<OrphanSet>;

  async fn delete_orphans(&self, orphans: &OrphanSet) -> Result<DeletedRows>;
}

/// Placeholder syntax of the backend behind the `Any` driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  /// `$1, $2, ...`
  Postgres,
  /// `?, ?, ...` (MySQL, SQLite)
  QuestionMark,
}

impl Dialect {
  pub fn from_url(url: &str) -> Self {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
      Dialect::Postgres
    } else {
      Dialect::QuestionMark
    }
  }

  pub fn placeholders(self, count: usize) -> String {
    match self {
      Dialect::Postgres => (1..=count)
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", "),
      Dialect::QuestionMark => vec!["?"; count].join(", "),
    }
  }
}

/// Database gateway. Holds no connection; every logical operation opens its
/// own and closes it before returning.
#[derive(Clone)]
pub struct Database {
  url: String,
  dialect: Dialect,
}

impl Database {
  pub fn new(url: impl Into<String>) -> Self {
    sqlx::any::install_default_drivers();
    let url = url.into();
    let dialect = Dialect::from_url(&url);
    Self { url, dialect }
  }

  pub fn from_config(config: &DatabaseConfig) -> Self {
    Self::new(config.url.clone())
  }

  pub(crate) async fn connect(&self) -> Result<AnyConnection> {
    let conn = AnyConnection::connect(&self.url).await?;
    tracing::debug!(backend = conn.backend_name(), "Opened database connection");
    Ok(conn)
  }

  /// Run `template` once per chunk of `ids`, with `{ids}` replaced by the
  /// chunk's placeholders, and collect the first column. NULLs are skipped.
  pub(crate) async fn select_ids_in(
    &self,
    conn: &mut AnyConnection,
    template: &str,
    ids: &[i64],
  ) -> Result<Vec<i64>> {
    let mut found = Vec::new();
    for chunk in ids.chunks(BIND_CHUNK) {
      let sql = template.replace("{ids}", &self.dialect.placeholders(chunk.len()));
      let mut query = sqlx::query_scalar::<_, Option<i64>>(&sql);
      for id in chunk {
        query = query.bind(*id);
      }
      found.extend(query.fetch_all(&mut *conn).await?.into_iter().flatten());
    }
    Ok(found)
  }

  /// Chunked `DELETE ... IN (...)`; returns the affected row count.
  pub(crate) async fn delete_ids_in(
    &self,
    conn: &mut AnyConnection,
    template: &str,
    ids: &[i64],
  ) -> Result<u64> {
    let mut affected = 0;
    for chunk in ids.chunks(BIND_CHUNK) {
      let sql = template.replace("{ids}", &self.dialect.placeholders(chunk.len()));
      let mut query = sqlx::query(&sql);
      for id in chunk {
        query = query.bind(*id);
      }
      affected += query.execute(&mut *conn).await?.rows_affected();
    }
    Ok(affected)
  }

  /// Join rows, then steps, then workflows, committed together. Any failure
  /// drops the transaction uncommitted, which rolls it back.
  pub(crate) async fn delete_workflow_rows(
    &self,
    join_workflow_ids: Option<&[i64]>,
    workflow_step_ids: &[i64],
    workflow_ids: &[i64],
  ) -> Result<DeletedRows> {
    let join_workflow_ids = join_workflow_ids.unwrap_or_default();
    if join_workflow_ids.is_empty() && workflow_step_ids.is_empty() && workflow_ids.is_empty() {
      return Ok(DeletedRows::default());
    }

    let mut conn = self.connect().await?;
    let mut tx = conn.begin().await?;
    let mut deleted = DeletedRows::default();

    deleted.join_rows = self
      .delete_ids_in(
        &mut tx,
        "DELETE FROM workflow_workflow_step WHERE workflow_commands_id IN ({ids})",
        join_workflow_ids,
      )
      .await?;
    deleted.workflow_steps = self
      .delete_ids_in(&mut tx, "DELETE FROM workflow_step WHERE id IN ({ids})", workflow_step_ids)
      .await?;
    deleted.workflows = self
      .delete_ids_in(&mut tx, "DELETE FROM workflow WHERE id IN ({ids})", workflow_ids)
      .await?;

    tx.commit().await?;
    conn.close().await?;

    tracing::debug!(
      join_rows = deleted.join_rows,
      workflow_steps = deleted.workflow_steps,
      workflows = deleted.workflows,
      "Deleted workflow rows"
    );
    Ok(deleted)
  }
}

#[async_trait]
impl DbClient for Database {
  async fn resolve_workflows(&self, execution_ids: &[i64]) -> Result<WorkflowRefs> {
    Database::resolve_workflows(self, execution_ids).await
  }

  async fn delete_workflows(&self, refs: &WorkflowRefs, unoptimized: bool) -> Result<DeletedRows> {
    Database::delete_workflows(self, refs, unoptimized).await
  }

  async fn find_orphans(&self, unoptimized: bool) -> Result<OrphanSet> {
    Database::find_orphans(self, unoptimized).await
  }

  async fn delete_orphans(&self, orphans: &OrphanSet) -> Result<DeletedRows> {
    Database::delete_orphans(self, orphans).await
  }
}
