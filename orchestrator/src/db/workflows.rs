// Workflow rows owned by executions about to be deleted
use sqlx::Connection;

use crate::db::Database;
use crate::error::Result;
use crate::models::{DeletedRows, WorkflowRefs};

impl Database {
  /// Workflow ids referenced by the given executions, plus the step ids those
  /// workflows own through `workflow_workflow_step`.
  pub async fn resolve_workflows(&self, execution_ids: &[i64]) -> Result<WorkflowRefs> {
    if execution_ids.is_empty() {
      return Ok(WorkflowRefs::default());
    }

    let mut conn = self.connect().await?;
    let workflow_ids = self
      .select_ids_in(
        &mut conn,
        "SELECT workflow_id FROM execution WHERE id IN ({ids})",
        execution_ids,
      )
      .await?;

    let workflow_step_ids = if workflow_ids.is_empty() {
      Vec::new()
    } else {
      self
        .select_ids_in(
          &mut conn,
          "SELECT workflow_step_id FROM workflow_workflow_step WHERE workflow_commands_id IN ({ids})",
          &workflow_ids,
        )
        .await?
    };
    conn.close().await?;

    let refs = WorkflowRefs {
      workflow_ids: workflow_ids.into_iter().collect(),
      workflow_step_ids: workflow_step_ids.into_iter().collect(),
    };
    tracing::debug!(
      executions = execution_ids.len(),
      workflows = refs.workflow_ids.len(),
      workflow_steps = refs.workflow_step_ids.len(),
      "Resolved workflows"
    );
    Ok(refs)
  }

  /// Delete resolved workflow rows in one transaction. With `unoptimized`
  /// the join rows are removed explicitly before the steps; otherwise the
  /// schema's cascading is relied on.
  pub async fn delete_workflows(&self, refs: &WorkflowRefs, unoptimized: bool) -> Result<DeletedRows> {
    let workflow_ids: Vec<i64> = refs.workflow_ids.iter().copied().collect();
    let workflow_step_ids: Vec<i64> = refs.workflow_step_ids.iter().copied().collect();
    let join_workflow_ids = unoptimized.then_some(workflow_ids.as_slice());

    self
      .delete_workflow_rows(join_workflow_ids, &workflow_step_ids, &workflow_ids)
      .await
  }
}
