//! Per-invocation execution state.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use weft_workflow::{Item, OutputSlots};

/// Per-node state machine. Disabled nodes go straight from `Pending`
/// to `Skipped` without an activity call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
  Pending,
  Executing,
  Completed,
  Failed,
  Skipped,
}

#[derive(Debug, Default)]
struct ContextInner {
  /// Node name -> output slots. Write-once; synthetic branch stash
  /// keys live here too and are dropped at run-data collection.
  results: HashMap<String, OutputSlots>,
  /// Names already claimed for execution.
  claimed: HashSet<String>,
  states: BTreeMap<String, NodeState>,
}

/// Mutable state for one workflow invocation.
///
/// Owned by a single driver; branch executors spawned from it share
/// the same instance. Claiming is insert-if-absent so two branches
/// racing to discover a node through different paths cannot both
/// execute it.
#[derive(Debug, Default)]
pub struct ExecutionContext {
  inner: Mutex<ContextInner>,
}

impl ExecutionContext {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, ContextInner> {
    self.inner.lock().expect("execution context poisoned")
  }

  /// Claim a node for execution. Returns false when already claimed —
  /// the at-most-once guard for every execution path.
  pub fn claim(&self, name: &str) -> bool {
    self.lock().claimed.insert(name.to_string())
  }

  /// Record a node's output. Write-once: a second write for the same
  /// name is ignored and reported as false.
  pub fn record(&self, name: &str, slots: OutputSlots) -> bool {
    let mut inner = self.lock();
    if inner.results.contains_key(name) {
      return false;
    }
    inner.results.insert(name.to_string(), slots);
    true
  }

  pub fn mark(&self, name: &str, state: NodeState) {
    self.lock().states.insert(name.to_string(), state);
  }

  /// Clone a node's full output. Cloning keeps the stored slots
  /// immutable no matter what downstream consumers do with the copy.
  pub fn output(&self, name: &str) -> Option<OutputSlots> {
    self.lock().results.get(name).cloned()
  }

  /// Clone one output slot of a node, if the node has produced it.
  pub fn slot(&self, name: &str, index: usize) -> Option<Vec<Item>> {
    self.lock().results.get(name).and_then(|slots| slots.get(index)).cloned()
  }

  pub fn has_result(&self, name: &str) -> bool {
    self.lock().results.contains_key(name)
  }

  pub fn states(&self) -> BTreeMap<String, NodeState> {
    self.lock().states.clone()
  }

  /// Consume the context, yielding the raw result map.
  pub fn into_results(self) -> HashMap<String, OutputSlots> {
    self
      .inner
      .into_inner()
      .expect("execution context poisoned")
      .results
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_claim_is_insert_if_absent() {
    let ctx = ExecutionContext::new();
    assert!(ctx.claim("a"));
    assert!(!ctx.claim("a"));
    assert!(ctx.claim("b"));
  }

  #[test]
  fn test_record_is_write_once() {
    let ctx = ExecutionContext::new();
    let first = vec![vec![Item::new(json!({ "v": 1 }))]];
    let second = vec![vec![Item::new(json!({ "v": 2 }))]];

    assert!(ctx.record("a", first.clone()));
    assert!(!ctx.record("a", second));
    assert_eq!(ctx.output("a"), Some(first));
  }

  #[test]
  fn test_reads_are_idempotent() {
    let ctx = ExecutionContext::new();
    ctx.record("a", vec![vec![Item::new(json!({ "v": 1 }))]]);

    let mut copy = ctx.output("a").expect("recorded");
    copy[0].push(Item::new(json!({ "v": 2 })));

    // Mutating the returned clone must not touch the stored slots.
    assert_eq!(ctx.output("a").expect("recorded")[0].len(), 1);
    assert_eq!(ctx.slot("a", 0).expect("slot 0").len(), 1);
  }
}
