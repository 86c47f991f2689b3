// Integration tests for the Rundeck client against a mock HTTP server
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use janitor_orchestrator::{ApiClient, CleanupError, Scope};

use crate::common::{create_test_client, create_test_client_with_timeouts, TEST_TOKEN};

#[tokio::test]
async fn test_list_projects_sends_auth_token() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/projects"))
    .and(header("X-Rundeck-Auth-Token", TEST_TOKEN))
    .and(header("Accept", "application/json"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([
      { "name": "ops", "description": "" },
      { "name": "data team", "description": "warehouse" }
    ])))
    .expect(1)
    .mount(&server)
    .await;

  let projects = create_test_client(&server.uri(), 200)
    .list_projects()
    .await
    .expect("Failed to list projects");

  assert_eq!(projects, vec!["ops", "data team"]);
}

#[tokio::test]
async fn test_list_jobs_encodes_project_name() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/data%20team/jobs"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([
      { "id": "a1b2", "name": "nightly" },
      { "id": "c3d4", "name": "hourly" }
    ])))
    .expect(1)
    .mount(&server)
    .await;

  let jobs = create_test_client(&server.uri(), 200)
    .list_jobs("data team")
    .await
    .unwrap();
  assert_eq!(jobs, vec!["a1b2", "c3d4"]);
}

#[tokio::test]
async fn test_count_reads_paging_total() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/ops/executions"))
    .and(query_param("olderFilter", "30d"))
    .and(query_param("max", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "paging": { "count": 1, "total": 250, "offset": 0, "max": 1 },
      "executions": [{ "id": 1, "status": "succeeded" }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let total = create_test_client(&server.uri(), 200)
    .count_aged_executions(&Scope::Project("ops".into()))
    .await
    .unwrap();
  assert_eq!(total, 250);
}

#[tokio::test]
async fn test_fetch_uses_job_endpoint_and_offset() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/job/a1b2/executions"))
    .and(query_param("max", "2"))
    .and(query_param("offset", "3"))
    .and(query_param("olderFilter", "30d"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "paging": { "count": 2, "total": 5, "offset": 3, "max": 2 },
      "executions": [
        { "id": 11, "status": "succeeded", "job": { "id": "a1b2", "name": "nightly" } },
        { "id": 12, "status": "running" }
      ]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let scope = Scope::Job {
    project: "ops".into(),
    id: "a1b2".into(),
  };
  let executions = create_test_client(&server.uri(), 2)
    .fetch_aged_executions(&scope, 3)
    .await
    .unwrap();

  assert_eq!(executions.len(), 2);
  assert_eq!(executions[0].job_name(), Some("nightly"));
  assert!(executions[1].is_running());
}

#[tokio::test]
async fn test_bulk_delete_posts_ids() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/19/executions/delete"))
    .and(header("Content-Type", "application/json"))
    .and(body_json(json!([1, 2, 3])))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "allsuccessful": true,
      "successCount": 3,
      "failedCount": 0,
      "requestCount": 3
    })))
    .expect(2)
    .mount(&server)
    .await;

  let client = create_test_client(&server.uri(), 200);
  for _ in 0..2 {
    let outcome = client.delete_executions(&[1, 2, 3]).await.unwrap();
    assert!(outcome.all_successful);
    assert_eq!(outcome.success_count, 3);
  }
}

#[tokio::test]
async fn test_running_listing_uses_running_endpoint() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/ops/executions/running"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "paging": { "count": 1, "total": 1, "offset": 0, "max": 200 },
      "executions": [{ "id": 5, "status": "running", "project": "ops" }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let executions = create_test_client(&server.uri(), 200)
    .list_executions("ops", true)
    .await
    .unwrap();
  assert_eq!(executions.len(), 1);
  assert_eq!(executions[0].id, 5);
}

#[tokio::test]
async fn test_server_error_is_transport() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/projects"))
    .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
    .mount(&server)
    .await;

  let err = create_test_client(&server.uri(), 200)
    .list_projects()
    .await
    .unwrap_err();

  assert!(matches!(err, CleanupError::Transport { .. }));
  assert!(err.to_string().contains("500"));
  assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_body_is_data_shape() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/projects"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
    .mount(&server)
    .await;

  let err = create_test_client(&server.uri(), 200)
    .list_projects()
    .await
    .unwrap_err();
  assert!(matches!(err, CleanupError::DataShape(_)));
}

#[tokio::test]
async fn test_missing_paging_is_data_shape() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/project/ops/executions"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "executions": [] })))
    .mount(&server)
    .await;

  let err = create_test_client(&server.uri(), 200)
    .count_aged_executions(&Scope::Project("ops".into()))
    .await
    .unwrap_err();
  assert!(matches!(err, CleanupError::DataShape(_)));
  assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_host_is_transport() {
  // Nothing listens on the discard port.
  let err = create_test_client("http://127.0.0.1:9", 200)
    .list_projects()
    .await
    .unwrap_err();
  assert!(matches!(err, CleanupError::Transport { .. }));
}

#[tokio::test]
async fn test_slow_listing_exceeds_search_timeout() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/19/projects"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!([{ "name": "ops" }]))
        .set_delay(Duration::from_millis(500)),
    )
    .mount(&server)
    .await;

  let client = create_test_client_with_timeouts(
    &server.uri(),
    200,
    Duration::from_millis(100),
    Duration::from_secs(5),
  );
  let err = client.list_projects().await.unwrap_err();

  assert!(matches!(err, CleanupError::Transport { .. }));
  assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_bulk_delete_uses_delete_timeout() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/19/executions/delete"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({
          "allsuccessful": true,
          "successCount": 2,
          "failedCount": 0,
          "requestCount": 2
        }))
        .set_delay(Duration::from_millis(500)),
    )
    .expect(1)
    .mount(&server)
    .await;

  let client = create_test_client_with_timeouts(
    &server.uri(),
    200,
    Duration::from_millis(100),
    Duration::from_secs(5),
  );
  let outcome = client
    .delete_executions(&[1, 2])
    .await
    .expect("delete should outlast the search timeout");

  assert!(outcome.all_successful);
  assert_eq!(outcome.success_count, 2);
}
