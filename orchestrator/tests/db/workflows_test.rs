// Integration tests for workflow resolution and page-level workflow deletion
use std::collections::BTreeSet;

use janitor_orchestrator::Database;

use crate::common::setup_test_db;

#[tokio::test]
async fn test_resolve_workflows_for_executions() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.insert_workflow(4, &[14, 15]).await.unwrap();
  test_db.insert_workflow(5, &[16]).await.unwrap();
  test_db.insert_execution(100, 4).await.unwrap();
  test_db.insert_execution(101, 5).await.unwrap();

  let refs = test_db
    .db
    .resolve_workflows(&[100])
    .await
    .expect("Failed to resolve workflows");

  assert_eq!(refs.workflow_ids, BTreeSet::from([4]));
  assert_eq!(refs.workflow_step_ids, BTreeSet::from([14, 15]));
}

#[tokio::test]
async fn test_resolve_unknown_executions_is_empty() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.insert_workflow(4, &[14]).await.unwrap();
  test_db.insert_execution(100, 4).await.unwrap();

  let refs = test_db.db.resolve_workflows(&[999, 1000]).await.unwrap();
  assert!(refs.is_empty());
}

#[tokio::test]
async fn test_empty_id_lists_never_touch_the_database() {
  // Connecting would fail: the directory does not exist and mode=rwc is absent.
  let db = Database::new("sqlite:///nonexistent/janitor/rundeck.db");

  let refs = db.resolve_workflows(&[]).await.expect("no connection needed");
  assert!(refs.is_empty());

  let rows = db
    .delete_workflows(&refs, true)
    .await
    .expect("no connection needed");
  assert_eq!(rows.workflows, 0);
  assert_eq!(rows.workflow_steps, 0);
}

#[tokio::test]
async fn test_resolve_binds_large_id_lists_in_chunks() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.seed_executions(1, 1200).await.unwrap();

  let ids: Vec<i64> = (1..=1200).collect();
  let refs = test_db.db.resolve_workflows(&ids).await.unwrap();

  assert_eq!(refs.workflow_ids.len(), 1200);
  assert_eq!(refs.workflow_step_ids.len(), 1200);
  assert!(refs.workflow_ids.contains(&11_200));
}

#[tokio::test]
async fn test_delete_workflows_leaves_join_rows_when_optimized() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.insert_workflow(4, &[14, 15]).await.unwrap();
  test_db.insert_workflow(5, &[16]).await.unwrap();
  test_db.insert_execution(100, 4).await.unwrap();
  test_db.insert_execution(101, 5).await.unwrap();

  let refs = test_db.db.resolve_workflows(&[100]).await.unwrap();
  let rows = test_db
    .db
    .delete_workflows(&refs, false)
    .await
    .expect("Failed to delete workflows");

  assert_eq!(rows.workflows, 1);
  assert_eq!(rows.workflow_steps, 2);
  assert_eq!(rows.join_rows, 0);
  assert_eq!(test_db.ids("workflow").await.unwrap(), vec![5]);
  assert_eq!(test_db.ids("workflow_step").await.unwrap(), vec![16]);
  assert_eq!(test_db.count("workflow_workflow_step").await.unwrap(), 3);
}

#[tokio::test]
async fn test_delete_workflows_removes_join_rows_when_unoptimized() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.insert_workflow(4, &[14, 15]).await.unwrap();
  test_db.insert_workflow(5, &[16]).await.unwrap();
  test_db.insert_execution(100, 4).await.unwrap();

  let refs = test_db.db.resolve_workflows(&[100]).await.unwrap();
  let rows = test_db.db.delete_workflows(&refs, true).await.unwrap();

  assert_eq!(rows.join_rows, 2);
  assert_eq!(rows.workflows, 1);
  assert_eq!(test_db.count("workflow_workflow_step").await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_already_deleted_workflows_is_harmless() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.insert_workflow(4, &[14]).await.unwrap();
  test_db.insert_execution(100, 4).await.unwrap();

  let refs = test_db.db.resolve_workflows(&[100]).await.unwrap();
  test_db.db.delete_workflows(&refs, true).await.unwrap();
  let rows = test_db.db.delete_workflows(&refs, true).await.unwrap();

  assert_eq!(rows.workflows, 0);
  assert_eq!(rows.workflow_steps, 0);
}
