use serde::{Deserialize, Serialize};
use weft_workflow::{Item, Node, OutputSlots};

/// Input for one activity invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCall {
  /// The node being processed, parameters included, unmodified.
  pub node: Node,
  /// Aggregated input slots for the node.
  pub input: Vec<Vec<Item>>,
  /// Identifier of the workflow invocation this call belongs to.
  pub invocation_id: String,
  /// Identifier of the calling workflow.
  pub caller_id: String,
}

/// Failure reported by the node logic itself, as opposed to a
/// transport-level failure of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFailure {
  pub message: String,
  pub node_name: String,
}

/// Output of one activity invocation.
///
/// A populated `error` field is terminal for the node — the engine
/// never retries it, and treats it the same as the host exhausting its
/// transport-level retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutput {
  pub data: OutputSlots,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<ActivityFailure>,
}

impl ActivityOutput {
  /// Successful output with a single default slot.
  pub fn single(items: Vec<Item>) -> Self {
    Self {
      data: vec![items],
      error: None,
    }
  }

  /// Successful output with explicit slots.
  pub fn slots(data: OutputSlots) -> Self {
    Self {
      data,
      error: None,
    }
  }

  /// Node-level failure.
  pub fn failed(node_name: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      data: Vec::new(),
      error: Some(ActivityFailure {
        message: message.into(),
        node_name: node_name.into(),
      }),
    }
  }
}
