use std::collections::HashMap;

use crate::connection::{ConnectionKind, ConnectionTable};
use crate::node::Node;

/// An incoming edge as seen from the target node: the parent's name and
/// the parent output slot the edge leaves from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentEdge {
  pub name: String,
  pub source_output: usize,
}

/// Adjacency built once per invocation from the connection table.
///
/// Only primary-kind connections are indexed. Lookups for names missing
/// from the table return empty slices — a dangling connection is a
/// recoverable inconsistency for the caller to log, never a panic.
#[derive(Debug, Clone)]
pub struct Graph {
  /// source -> children grouped by source output index.
  children: HashMap<String, Vec<Vec<String>>>,
  /// target -> incoming primary edges, sources in sorted order.
  parents: HashMap<String, Vec<ParentEdge>>,
  /// Nodes with no incoming primary connection, in definition order.
  start_set: Vec<String>,
}

impl Graph {
  /// Build the adjacency from a node list and connection table.
  pub fn new(nodes: &[Node], connections: &ConnectionTable) -> Self {
    let mut children: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    let mut parents: HashMap<String, Vec<ParentEdge>> = HashMap::new();

    // The table is a sorted map, so sources (and therefore the parent
    // lists built here) come out in the same order on every replay.
    for (source, by_kind) in connections {
      let Some(outputs) = by_kind.get(&ConnectionKind::Primary) else {
        continue;
      };

      let slots = children.entry(source.clone()).or_default();
      if slots.len() < outputs.len() {
        slots.resize(outputs.len(), Vec::new());
      }

      for (output_index, targets) in outputs.iter().enumerate() {
        for target in targets {
          slots[output_index].push(target.node.clone());
          parents.entry(target.node.clone()).or_default().push(ParentEdge {
            name: source.clone(),
            source_output: output_index,
          });
        }
      }
    }

    let start_set = nodes
      .iter()
      .filter(|n| parents.get(&n.name).is_none_or(|p| p.is_empty()))
      .map(|n| n.name.clone())
      .collect();

    Self {
      children,
      parents,
      start_set,
    }
  }

  /// All primary-kind children of a node, across every output slot, in
  /// ascending output-index order then connection order.
  pub fn children_of(&self, name: &str) -> Vec<String> {
    self
      .children
      .get(name)
      .map(|slots| slots.iter().flatten().cloned().collect())
      .unwrap_or_default()
  }

  /// Children connected to one specific output slot of a node.
  pub fn children_of_output(&self, name: &str, output_index: usize) -> &[String] {
    self
      .children
      .get(name)
      .and_then(|slots| slots.get(output_index))
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Incoming primary edges of a node, each carrying the source output
  /// slot it leaves from.
  pub fn parents_of(&self, name: &str) -> &[ParentEdge] {
    self
      .parents
      .get(name)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Structural start set: nodes with zero incoming primary
  /// connections, in definition order.
  pub fn start_set(&self) -> &[String] {
    &self.start_set
  }
}
