//! Activity boundary error types.

use thiserror::Error;

/// Transport-level failures of an activity call.
///
/// These describe the delivery of the call, not the node logic — a node
/// that runs and reports its own failure does so through
/// [`ActivityFailure`](crate::ActivityFailure) on the output.
#[derive(Debug, Error)]
pub enum ActivityError {
  /// One attempt exceeded the start-to-close timeout.
  #[error("activity timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The host gave up after exhausting the retry policy.
  #[error("activity failed after {attempts} attempts: {message}")]
  Exhausted { attempts: u32, message: String },

  /// The handler failed to deliver the call.
  #[error("activity transport failure: {message}")]
  Transport { message: String },

  /// The invocation was cancelled.
  #[error("activity cancelled")]
  Cancelled,
}
