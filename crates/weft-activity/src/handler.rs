use std::future::Future;

use crate::call::{ActivityCall, ActivityOutput};
use crate::error::ActivityError;

/// The activity boundary: the only call the engine makes into
/// node-specific logic.
///
/// Implementations are stateless per call. Delivery guarantees (retry,
/// backoff, timeout) belong to the host side — see
/// [`RetryRunner`](crate::RetryRunner) — never to the engine, which
/// treats any `Err` as terminal for the node.
pub trait ActivityHandler: Send + Sync {
  /// Execute the node's processing step.
  fn call(
    &self,
    call: ActivityCall,
  ) -> impl Future<Output = Result<ActivityOutput, ActivityError>> + Send;

  /// Checkpoint hook, invoked after each committed node so the durable
  /// host can persist progress between nodes. No-op by default.
  fn checkpoint(
    &self,
    invocation_id: &str,
    node_name: &str,
  ) -> impl Future<Output = ()> + Send {
    let _ = (invocation_id, node_name);
    async {}
  }
}
