//! Input aggregation.
//!
//! A node's input is the concatenation of its executed parents' output
//! slices, each read from the slot the connecting edge leaves from, in
//! parent-enumeration order. Branch roots are the exception: the
//! driver overrides their input with exactly their branch's slice so a
//! branch never sees a merge across its siblings.

use weft_workflow::{Graph, Item};

use crate::context::ExecutionContext;

/// Aggregate a node's input from its executed parents.
///
/// Parents that have not produced output contribute nothing. A node
/// with no upstream data receives a single empty item — never an
/// absent input — which keeps the activity contract uniform.
pub fn aggregate(graph: &Graph, ctx: &ExecutionContext, name: &str) -> Vec<Vec<Item>> {
  let mut items = Vec::new();

  for edge in graph.parents_of(name) {
    if let Some(slice) = ctx.slot(&edge.name, edge.source_output) {
      items.extend(slice);
    }
  }

  if items.is_empty() {
    items.push(Item::empty());
  }

  vec![items]
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use weft_workflow::Workflow;

  fn fan_in_workflow() -> Workflow {
    serde_json::from_value(json!({
      "id": "wf",
      "name": "Fan-in",
      "nodes": [
        { "id": "1", "name": "left", "type": "http" },
        { "id": "2", "name": "right", "type": "http" },
        { "id": "3", "name": "sink", "type": "sql" }
      ],
      "connections": {
        "left": { "primary": [ [ { "node": "sink", "type": "primary", "index": 0 } ] ] },
        "right": { "primary": [ [ { "node": "sink", "type": "primary", "index": 0 } ] ] }
      }
    }))
    .expect("fixture")
  }

  #[test]
  fn test_concatenates_in_parent_order() {
    let workflow = fan_in_workflow();
    let graph = workflow.graph();
    let ctx = ExecutionContext::new();

    ctx.record("left", vec![vec![Item::new(json!({ "from": "left" }))]]);
    ctx.record("right", vec![vec![Item::new(json!({ "from": "right" }))]]);

    let input = aggregate(&graph, &ctx, "sink");
    assert_eq!(input.len(), 1);
    assert_eq!(input[0].len(), 2);
    assert_eq!(input[0][0].payload, json!({ "from": "left" }));
    assert_eq!(input[0][1].payload, json!({ "from": "right" }));
  }

  #[test]
  fn test_unexecuted_parent_contributes_nothing() {
    let workflow = fan_in_workflow();
    let graph = workflow.graph();
    let ctx = ExecutionContext::new();

    ctx.record("right", vec![vec![Item::new(json!({ "from": "right" }))]]);

    let input = aggregate(&graph, &ctx, "sink");
    assert_eq!(input[0].len(), 1);
    assert_eq!(input[0][0].payload, json!({ "from": "right" }));
  }

  #[test]
  fn test_no_upstream_data_yields_single_empty_item() {
    let workflow = fan_in_workflow();
    let graph = workflow.graph();
    let ctx = ExecutionContext::new();

    let input = aggregate(&graph, &ctx, "left");
    assert_eq!(input, vec![vec![Item::empty()]]);

    // Parents exist but have produced nothing yet: same shape.
    let input = aggregate(&graph, &ctx, "sink");
    assert_eq!(input, vec![vec![Item::empty()]]);
  }
}
