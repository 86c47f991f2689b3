//! Retry with a fixed backoff for paired deletions and orphan cleanup.
//!
//! `attempts` is the total number of tries, the first one included, so a
//! policy of 5 never makes a sixth call.

use std::fmt::Display;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CleanupError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn new(attempts: u32, delay: Duration) -> Self {
    Self {
      attempts: attempts.max(1),
      delay,
    }
  }

  pub fn start(&self) -> Backoff {
    Backoff {
      policy: *self,
      failures: 0,
    }
  }
}

/// Tracks failed attempts of one retried unit of work.
///
/// ```ignore
/// let mut backoff = policy.start();
/// loop {
///     match do_work().await {
///         Ok(value) => break value,
///         Err(err) => backoff.wait(err, &scope).await?,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Backoff {
  policy: RetryPolicy,
  failures: u32,
}

impl Backoff {
  /// Attempts made so far, failed ones included.
  pub fn attempts(&self) -> u32 {
    self.failures
  }

  /// Record a failed attempt. Sleeps and returns `Ok(())` when another
  /// attempt is allowed, otherwise hands the error back.
  pub async fn wait(&mut self, err: CleanupError, label: &(dyn Display + Sync)) -> Result<()> {
    self.failures += 1;

    if !err.is_retryable() {
      debug!(scope = %label, error = %err, "Not retrying non-transient failure");
      return Err(err);
    }

    if self.failures >= self.policy.attempts {
      warn!(
        scope = %label,
        error = %err,
        attempts = self.failures,
        "Giving up after all retry attempts"
      );
      return Err(err);
    }

    warn!(
      scope = %label,
      error = %err,
      attempt = self.failures,
      max_attempts = self.policy.attempts,
      delay_secs = self.policy.delay.as_secs(),
      "{} #{} try not successful. Trying again in {} seconds...",
      label,
      self.failures,
      self.policy.delay.as_secs()
    );
    tokio::time::sleep(self.policy.delay).await;
    Ok(())
  }
}
