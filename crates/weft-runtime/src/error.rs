//! Engine error types.

use weft_workflow::WorkflowError;

/// Fatal conditions of a workflow invocation.
///
/// None of these escape [`Runtime::invoke`](crate::Runtime::invoke) —
/// the invocation boundary folds them into the output's status/error
/// fields. Graph inconsistencies (dangling connections) are not here:
/// they are logged and skipped at the point of use.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The definition failed validation before any node executed.
  #[error("invalid workflow definition: {0}")]
  Definition(#[from] WorkflowError),

  /// Start-set resolution produced no nodes.
  #[error("no start node: every node has an incoming primary connection")]
  NoStartNode,

  /// The caller-designated start node does not exist.
  #[error("start node '{0}' not found in workflow")]
  UnknownStartNode(String),

  /// A node's activity reported an error, or the host exhausted its
  /// delivery retries. Both are terminal for the invocation outside a
  /// branch context.
  #[error("node '{node}' failed: {message}")]
  NodeFailed { node: String, message: String },

  /// The invocation was cancelled by the host.
  #[error("execution cancelled")]
  Cancelled,
}
