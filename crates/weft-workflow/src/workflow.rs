use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionTable;
use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::Node;

/// A workflow definition: a flat node list plus the connection table.
///
/// Immutable for the duration of one execution. Node order is
/// significant — start-set resolution and run-data collection follow
/// definition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub id: String,
  pub name: String,
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub connections: ConnectionTable,
}

impl Workflow {
  /// Build the adjacency structure for traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.connections)
  }

  /// Look up a node by name.
  pub fn get_node(&self, name: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.name == name)
  }

  /// Look up a node by name, or fail.
  pub fn node(&self, name: &str) -> Result<&Node, WorkflowError> {
    self
      .get_node(name)
      .ok_or_else(|| WorkflowError::NodeNotFound(name.to_string()))
  }

  /// Validate the definition invariants: node names must be unique.
  ///
  /// Connections referencing unknown nodes are deliberately not checked
  /// here — a dangling connection is logged and skipped at the point of
  /// use, not treated as fatal.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for node in &self.nodes {
      if !seen.insert(node.name.as_str()) {
        return Err(WorkflowError::DuplicateNode(node.name.clone()));
      }
    }
    Ok(())
  }
}
