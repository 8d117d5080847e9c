//! Host-side delivery: retry with backoff and start-to-close timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::call::{ActivityCall, ActivityOutput};
use crate::error::ActivityError;
use crate::handler::ActivityHandler;

/// Retry policy governing at-least-once activity delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
  /// Backoff before the first retry.
  pub initial_interval_ms: u64,
  /// Multiplicative growth of the backoff per retry.
  pub backoff_coefficient: f64,
  /// Cap on the backoff interval.
  pub maximum_interval_ms: u64,
  /// Total attempt budget, the first attempt included.
  pub maximum_attempts: u32,
  /// Start-to-close timeout bounding each attempt.
  pub start_to_close_timeout_ms: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      initial_interval_ms: 100,
      backoff_coefficient: 2.0,
      maximum_interval_ms: 10_000,
      maximum_attempts: 3,
      start_to_close_timeout_ms: 30_000,
    }
  }
}

impl RetryPolicy {
  /// Backoff to sleep after the given 1-based attempt fails.
  fn backoff_after(&self, attempt: u32) -> Duration {
    let factor = self.backoff_coefficient.powi(attempt.saturating_sub(1) as i32);
    let ms = (self.initial_interval_ms as f64 * factor) as u64;
    Duration::from_millis(ms.min(self.maximum_interval_ms))
  }
}

/// Wraps a handler with the host delivery contract.
///
/// Transport failures and timeouts are retried per the policy;
/// node-reported failures (the `error` field on a successful call) are
/// terminal and returned as-is. Checkpoints pass straight through to
/// the inner handler.
pub struct RetryRunner<H> {
  inner: H,
  policy: RetryPolicy,
  cancel: CancellationToken,
}

impl<H: ActivityHandler> RetryRunner<H> {
  pub fn new(inner: H, policy: RetryPolicy, cancel: CancellationToken) -> Self {
    Self {
      inner,
      policy,
      cancel,
    }
  }

  async fn run(&self, call: ActivityCall) -> Result<ActivityOutput, ActivityError> {
    let timeout = Duration::from_millis(self.policy.start_to_close_timeout_ms);
    let mut attempt = 1u32;

    loop {
      if self.cancel.is_cancelled() {
        return Err(ActivityError::Cancelled);
      }

      let outcome = tokio::select! {
        outcome = tokio::time::timeout(timeout, self.inner.call(call.clone())) => outcome,
        _ = self.cancel.cancelled() => return Err(ActivityError::Cancelled),
      };

      let message = match outcome {
        Ok(Ok(output)) => return Ok(output),
        Ok(Err(ActivityError::Cancelled)) => return Err(ActivityError::Cancelled),
        Ok(Err(e)) => e.to_string(),
        Err(_) => ActivityError::Timeout {
          timeout_ms: self.policy.start_to_close_timeout_ms,
        }
        .to_string(),
      };

      if attempt >= self.policy.maximum_attempts {
        return Err(ActivityError::Exhausted {
          attempts: attempt,
          message,
        });
      }

      let backoff = self.policy.backoff_after(attempt);
      warn!(
        node = %call.node.name,
        attempt,
        backoff_ms = backoff.as_millis() as u64,
        error = %message,
        "activity_retry"
      );
      tokio::time::sleep(backoff).await;
      attempt += 1;
    }
  }
}

impl<H: ActivityHandler> ActivityHandler for RetryRunner<H> {
  fn call(
    &self,
    call: ActivityCall,
  ) -> impl std::future::Future<Output = Result<ActivityOutput, ActivityError>> + Send {
    self.run(call)
  }

  fn checkpoint(
    &self,
    invocation_id: &str,
    node_name: &str,
  ) -> impl std::future::Future<Output = ()> + Send {
    self.inner.checkpoint(invocation_id, node_name)
  }
}
