use thiserror::Error;

use crate::Scope;

#[derive(Debug, Error)]
pub enum CleanupError {
  #[error("Request to {endpoint} failed: {message}")]
  Transport { endpoint: String, message: String },

  #[error("Errors on deleting requested executions ({failed}/{requested} failed)")]
  PartialDelete { failed: u64, requested: u64 },

  #[error("Unexpected response shape: {0}")]
  DataShape(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Invalid configuration: {0}")]
  Validation(String),

  #[error("Project '{0}' does not exist")]
  UnknownProject(String),

  #[error("{scope}: {source}")]
  ScopeFailed {
    scope: Scope,
    #[source]
    source: Box<CleanupError>,
  },

  #[error("{scope}: page {page} could not be cleaned after {attempts} attempt(s): {source}")]
  PageFailed {
    scope: Scope,
    page: u64,
    attempts: u32,
    #[source]
    source: Box<CleanupError>,
  },

  #[error("{scope}: orphaned workflow cleanup failed: {source}")]
  ReconcileFailed {
    scope: Scope,
    #[source]
    source: Box<CleanupError>,
  },

  #[error("{scope}: interrupted by operator before page {page}")]
  Interrupted { scope: Scope, page: u64 },
}

impl CleanupError {
  pub fn transport(endpoint: impl Into<String>, message: impl ToString) -> Self {
    Self::Transport {
      endpoint: endpoint.into(),
      message: message.to_string(),
    }
  }

  /// Failures a retry of the same page can fix. Shape mismatches and
  /// configuration problems are deterministic and are never retried.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      Self::Transport { .. } | Self::PartialDelete { .. } | Self::Database(_)
    )
  }

  pub(crate) fn in_scope(self, scope: &Scope) -> Self {
    Self::ScopeFailed {
      scope: scope.clone(),
      source: Box::new(self),
    }
  }
}

pub type Result<T> = std::result::Result<T, CleanupError>;
