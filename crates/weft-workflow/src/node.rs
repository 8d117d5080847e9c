use serde::{Deserialize, Serialize};

/// A single item flowing through the graph: an opaque payload plus
/// optional per-item metadata. The engine never inspects either field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub payload: serde_json::Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta: Option<serde_json::Value>,
}

impl Item {
  /// Create an item from a payload, with no metadata.
  pub fn new(payload: serde_json::Value) -> Self {
    Self {
      payload,
      meta: None,
    }
  }

  /// The placeholder item handed to nodes with no upstream data.
  pub fn empty() -> Self {
    Self::new(serde_json::Value::Object(serde_json::Map::new()))
  }
}

/// Output of one node execution: an array of output slots, each an
/// ordered run of items. Slot 0 is the default slot; conditional nodes
/// use slots 1..n for their alternative branches.
pub type OutputSlots = Vec<Vec<Item>>;

/// Classification derived from a node's type tag.
///
/// Only `Gate` and `Switch` are conditional kinds — nodes whose output
/// slots select which downstream branches run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
  /// Entry-point node (type tag contains "trigger").
  Trigger,
  /// Boolean gate with two output slots.
  Gate,
  /// Multi-way switch with N output slots.
  Switch,
  /// Everything else.
  Standard,
}

/// A unit of work in the workflow graph.
///
/// The `parameters` bag is opaque to the engine and passed through to
/// the activity boundary unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub node_type: String,
  #[serde(default)]
  pub parameters: serde_json::Value,
  #[serde(default)]
  pub disabled: bool,
}

impl Node {
  /// Classify the node from its type tag. Namespaced tags are matched
  /// on the final segment, so "core.if" and "if" are both gates.
  pub fn kind(&self) -> NodeKind {
    let tag = self.node_type.rsplit('.').next().unwrap_or(&self.node_type);
    if tag == "if" || tag == "gate" {
      NodeKind::Gate
    } else if tag == "switch" {
      NodeKind::Switch
    } else if tag.contains("trigger") {
      NodeKind::Trigger
    } else {
      NodeKind::Standard
    }
  }

  /// Whether this node's outputs select downstream branches.
  pub fn is_conditional(&self) -> bool {
    matches!(self.kind(), NodeKind::Gate | NodeKind::Switch)
  }
}
