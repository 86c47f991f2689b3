// Thin HTTP access to the Rundeck REST API
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{CleanupError, Result};

pub const AUTH_HEADER: &str = "X-Rundeck-Auth-Token";

/// Issues GET/POST calls and hands back parsed JSON. Network failures,
/// timeouts and non-2xx statuses come back as `Transport` errors; bodies that
/// are not JSON come back as `DataShape` errors.
pub struct HttpGateway {
  client: reqwest::Client,
  base_url: String,
  search_timeout: Duration,
  delete_timeout: Duration,
}

impl HttpGateway {
  pub fn from_config(config: &ApiConfig) -> Result<Self> {
    Self::new(
      config.base_url(),
      &config.auth_token,
      config.search_timeout,
      config.delete_timeout,
    )
  }

  pub fn new(
    base_url: impl Into<String>,
    auth_token: &str,
    search_timeout: Duration,
    delete_timeout: Duration,
  ) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(
      AUTH_HEADER,
      HeaderValue::from_str(auth_token)
        .map_err(|_| CleanupError::Validation("API token contains invalid characters".into()))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .connect_timeout(search_timeout)
      .build()
      .map_err(|e| CleanupError::transport("client", e))?;

    Ok(Self {
      client,
      base_url: base_url.into().trim_end_matches('/').to_string(),
      search_timeout,
      delete_timeout,
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, endpoint: &str) -> String {
    format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
  }

  /// Read call, bounded by the search timeout.
  pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value> {
    let request = self
      .client
      .get(self.url(endpoint))
      .query(query)
      .timeout(self.search_timeout);
    self.send(endpoint, request).await
  }

  /// Write call, bounded by the (longer) delete timeout.
  pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Value> {
    let request = self
      .client
      .post(self.url(endpoint))
      .json(body)
      .timeout(self.delete_timeout);
    self.send(endpoint, request).await
  }

  async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> Result<Value> {
    let resp = request
      .send()
      .await
      .map_err(|e| CleanupError::transport(endpoint, e))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      tracing::debug!(endpoint, %status, body = %body, "Rundeck API returned an error status");
      return Err(CleanupError::transport(
        endpoint,
        format!("Failing accessing API endpoint with http code: {}", status.as_u16()),
      ));
    }

    let body = resp
      .text()
      .await
      .map_err(|e| CleanupError::transport(endpoint, e))?;

    serde_json::from_str(&body).map_err(|e| {
      CleanupError::DataShape(format!("response from {} is not JSON: {}", endpoint, e))
    })
  }
}
