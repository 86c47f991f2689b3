use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use janitor_orchestrator::{CleanupError, CleanupOptions, Orchestrator};

use crate::common::{create_test_client, setup_test_db};

fn execution_json(id: i64, age_days: i64, status: &str) -> Value {
  let at = (Utc::now() - chrono::Duration::days(age_days)).timestamp_millis();
  json!({
    "id": id,
    "status": status,
    "project": "ops",
    "date-started": { "unixtime": at },
    "date-ended": { "unixtime": at }
  })
}

async fn mount_listing(server: &MockServer, total: u64, executions: Vec<Value>) {
  Mock::given(method("GET"))
    .and(path("/api/19/projects"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "ops" }])))
    .mount(server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/ops/executions"))
    .and(query_param("max", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "paging": { "count": 1, "total": total, "offset": 0, "max": 1 },
      "executions": []
    })))
    .mount(server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/ops/executions"))
    .and(query_param("max", "200"))
    .and(query_param("offset", "0"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "paging": { "count": executions.len(), "total": total, "offset": 0, "max": 200 },
      "executions": executions
    })))
    .expect(1)
    .mount(server)
    .await;
}

fn options() -> CleanupOptions {
  CleanupOptions {
    retries: 2,
    backoff: Duration::ZERO,
    ..CleanupOptions::default()
  }
}

#[tokio::test]
async fn test_cleanup_deletes_executions_workflows_and_orphans() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.seed_executions(1, 3).await.unwrap();
  test_db.insert_workflow(5, &[6]).await.unwrap();

  let server = MockServer::start().await;
  mount_listing(
    &server,
    4,
    vec![
      execution_json(1, 40, "succeeded"),
      execution_json(2, 35, "failed"),
      execution_json(3, 31, "aborted"),
      execution_json(4, 90, "running"),
    ],
  )
  .await;
  Mock::given(method("POST"))
    .and(path("/api/19/executions/delete"))
    .and(body_json(json!([1, 2, 3])))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "allsuccessful": true,
      "successCount": 3,
      "failedCount": 0,
      "requestCount": 3
    })))
    .expect(1)
    .mount(&server)
    .await;

  let orchestrator = Orchestrator::new(
    create_test_client(&server.uri(), 200),
    test_db.db.clone(),
    200,
    "30d".parse().unwrap(),
  );
  let summary = orchestrator
    .clean(&options())
    .await
    .expect("Cleanup failed");

  assert_eq!(summary.executions_deleted, 3);
  assert_eq!(summary.workflows_deleted, 3);
  assert_eq!(summary.workflow_steps_deleted, 3);
  assert_eq!(summary.orphan_workflows_deleted, 1);
  assert_eq!(summary.orphan_workflow_steps_deleted, 1);
  assert!(test_db.ids("workflow").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_api_delete_keeps_workflows() {
  let test_db = setup_test_db()
    .await
    .expect("Failed to setup test database");
  test_db.seed_executions(1, 2).await.unwrap();

  let server = MockServer::start().await;
  mount_listing(
    &server,
    2,
    vec![execution_json(1, 40, "succeeded"), execution_json(2, 40, "succeeded")],
  )
  .await;
  Mock::given(method("POST"))
    .and(path("/api/19/executions/delete"))
    .respond_with(ResponseTemplate::new(503))
    .expect(2)
    .mount(&server)
    .await;

  let orchestrator = Orchestrator::new(
    create_test_client(&server.uri(), 200),
    test_db.db.clone(),
    200,
    "30d".parse().unwrap(),
  );
  let err = orchestrator.clean(&options()).await.unwrap_err();

  assert!(matches!(err, CleanupError::PageFailed { page: 0, attempts: 2, .. }));
  assert_eq!(test_db.ids("workflow").await.unwrap(), vec![10_001, 10_002]);
}
