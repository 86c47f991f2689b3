// Workflow rows left behind by executions that no longer exist
use sqlx::Connection;

use crate::db::Database;
use crate::error::Result;
use crate::models::{DeletedRows, OrphanSet};

/// Workflows older than the oldest surviving execution that no schedule
/// still points at.
const ORPHAN_WORKFLOWS: &str = "SELECT w.id FROM workflow w \
   WHERE w.id < (SELECT MIN(e.workflow_id) FROM execution e) \
   AND NOT EXISTS (SELECT 1 FROM scheduled_execution s WHERE s.workflow_id = w.id) \
   ORDER BY w.id";

impl Database {
  pub async fn find_orphans(&self, unoptimized: bool) -> Result<OrphanSet> {
    let mut conn = self.connect().await?;

    let workflow_ids: Vec<i64> = sqlx::query_scalar(ORPHAN_WORKFLOWS)
      .fetch_all(&mut conn)
      .await?;

    if workflow_ids.is_empty() {
      conn.close().await?;
      return Ok(OrphanSet {
        join_workflow_ids: unoptimized.then(Vec::new),
        ..OrphanSet::default()
      });
    }

    let mut workflow_step_ids = self
      .select_ids_in(
        &mut conn,
        "SELECT workflow_step_id FROM workflow_workflow_step WHERE workflow_commands_id IN ({ids})",
        &workflow_ids,
      )
      .await?;
    workflow_step_ids.sort_unstable();
    workflow_step_ids.dedup();

    let join_workflow_ids = if unoptimized {
      let mut ids = self
        .select_ids_in(
          &mut conn,
          "SELECT workflow_commands_id FROM workflow_workflow_step WHERE workflow_commands_id IN ({ids})",
          &workflow_ids,
        )
        .await?;
      ids.sort_unstable();
      ids.dedup();
      Some(ids)
    } else {
      None
    };
    conn.close().await?;

    tracing::debug!(
      workflows = workflow_ids.len(),
      workflow_steps = workflow_step_ids.len(),
      "Found orphaned workflows"
    );
    Ok(OrphanSet {
      workflow_ids,
      workflow_step_ids,
      join_workflow_ids,
    })
  }

  pub async fn delete_orphans(&self, orphans: &OrphanSet) -> Result<DeletedRows> {
    self
      .delete_workflow_rows(
        orphans.join_workflow_ids.as_deref(),
        &orphans.workflow_step_ids,
        &orphans.workflow_ids,
      )
      .await
  }
}
