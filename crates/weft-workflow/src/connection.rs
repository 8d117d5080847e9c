use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Edge kinds.
///
/// Only `Primary` participates in execution ordering and branch
/// semantics. `Annotation` edges carry auxiliary relationships and are
/// ignored by the scheduler.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
  Primary,
  Annotation,
}

/// The receiving end of a connection: target node, kind, and the
/// target's input index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTarget {
  pub node: String,
  #[serde(rename = "type")]
  pub kind: ConnectionKind,
  pub index: usize,
}

/// Connection table as it appears in the definition: source node name,
/// then kind, then an array indexed by source output, each holding the
/// targets fanning out from that output.
///
/// Sorted maps, not hash maps: every iteration over this table must
/// produce the same order on replay.
pub type ConnectionTable = BTreeMap<String, BTreeMap<ConnectionKind, Vec<Vec<ConnectionTarget>>>>;
