//! Integration tests for conditional branch execution: gate and switch
//! fan-out, branch isolation, nested conditionals, and rejoins.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio_util::sync::CancellationToken;
use weft_activity::{ActivityCall, ActivityError, ActivityHandler, ActivityOutput};
use weft_runtime::{Invocation, NodeState, RunStatus, Runtime};
use weft_workflow::{Item, OutputSlots, Workflow};

#[derive(Default)]
struct Recorded {
  calls: Vec<String>,
  inputs: HashMap<String, Vec<Vec<Item>>>,
}

#[derive(Clone, Default)]
struct MockHandler {
  outputs: HashMap<String, OutputSlots>,
  fail: HashSet<String>,
  recorded: Arc<Mutex<Recorded>>,
}

impl MockHandler {
  fn new() -> Self {
    Self::default()
  }

  fn with_output(mut self, node: &str, slots: OutputSlots) -> Self {
    self.outputs.insert(node.to_string(), slots);
    self
  }

  fn failing(mut self, node: &str) -> Self {
    self.fail.insert(node.to_string());
    self
  }

  fn calls(&self) -> Vec<String> {
    self.recorded.lock().unwrap().calls.clone()
  }

  fn input_of(&self, node: &str) -> Option<Vec<Vec<Item>>> {
    self.recorded.lock().unwrap().inputs.get(node).cloned()
  }
}

impl ActivityHandler for MockHandler {
  async fn call(&self, call: ActivityCall) -> Result<ActivityOutput, ActivityError> {
    {
      let mut recorded = self.recorded.lock().unwrap();
      recorded.calls.push(call.node.name.clone());
      recorded
        .inputs
        .insert(call.node.name.clone(), call.input.clone());
    }

    if self.fail.contains(&call.node.name) {
      return Ok(ActivityOutput::failed(call.node.name, "injected failure"));
    }

    match self.outputs.get(&call.node.name) {
      Some(slots) => Ok(ActivityOutput::slots(slots.clone())),
      None => Ok(ActivityOutput::slots(call.input)),
    }
  }
}

fn parse(value: serde_json::Value) -> Workflow {
  serde_json::from_value(value).expect("failed to parse workflow definition")
}

fn item(payload: serde_json::Value) -> Item {
  Item::new(payload)
}

async fn invoke(workflow: Workflow, handler: MockHandler) -> weft_runtime::ExecutionOutput {
  let runtime = Runtime::new(workflow, handler);
  runtime
    .invoke(Invocation::new("exec-1"), CancellationToken::new())
    .await
}

/// src -> gate, gate true output -> t1, false output -> f1.
fn gate_workflow() -> Workflow {
  parse(json!({
    "id": "wf-gate",
    "name": "Gate",
    "nodes": [
      { "id": "1", "name": "src", "type": "http" },
      { "id": "2", "name": "gate", "type": "core.if" },
      { "id": "3", "name": "t1", "type": "transform" },
      { "id": "4", "name": "f1", "type": "transform" }
    ],
    "connections": {
      "src": { "primary": [ [ { "node": "gate", "type": "primary", "index": 0 } ] ] },
      "gate": { "primary": [
        [ { "node": "t1", "type": "primary", "index": 0 } ],
        [ { "node": "f1", "type": "primary", "index": 0 } ]
      ] }
    }
  }))
}

#[tokio::test]
async fn test_gate_true_branch_isolation() {
  let handler = MockHandler::new()
    .with_output("gate", vec![vec![item(json!({ "pass": true }))], vec![]]);
  let recorder = handler.clone();

  let output = invoke(gate_workflow(), handler).await;

  assert_eq!(output.status, RunStatus::Success);
  assert!(output.run_data.contains_key("gate"));
  assert!(output.run_data.contains_key("t1"));
  assert!(!output.run_data.contains_key("f1"));
  assert!(!recorder.calls().contains(&"f1".to_string()));
  assert_eq!(output.node_states["f1"], NodeState::Pending);
}

#[tokio::test]
async fn test_gate_false_branch_isolation() {
  let handler = MockHandler::new()
    .with_output("gate", vec![vec![], vec![item(json!({ "pass": false }))]]);
  let recorder = handler.clone();

  let output = invoke(gate_workflow(), handler).await;

  assert_eq!(output.status, RunStatus::Success);
  assert!(output.run_data.contains_key("f1"));
  assert!(!output.run_data.contains_key("t1"));
  assert!(!recorder.calls().contains(&"t1".to_string()));
}

#[tokio::test]
async fn test_branch_root_sees_exactly_its_slice() {
  let true_items = vec![
    item(json!({ "n": 1 })),
    item(json!({ "n": 2 })),
  ];
  let handler =
    MockHandler::new().with_output("gate", vec![true_items.clone(), vec![]]);
  let recorder = handler.clone();

  invoke(gate_workflow(), handler).await;

  // The branch root's input is the branch slice itself, not an
  // aggregation over the gate's combined outputs.
  let t1_input = recorder.input_of("t1").expect("t1 was called");
  assert_eq!(t1_input, vec![true_items]);
}

#[tokio::test]
async fn test_switch_fan_out_with_isolated_failure() {
  // Switch with four outputs; outputs 0 and 2 carry data. The branch
  // under output 2 fails — output 0's descendants must be unaffected
  // and the invocation itself must succeed.
  let workflow = parse(json!({
    "id": "wf-switch",
    "name": "Switch",
    "nodes": [
      { "id": "1", "name": "route", "type": "core.switch" },
      { "id": "2", "name": "c0", "type": "transform" },
      { "id": "3", "name": "c1", "type": "transform" },
      { "id": "4", "name": "c2", "type": "transform" },
      { "id": "5", "name": "c3", "type": "transform" },
      { "id": "6", "name": "d0", "type": "sql" }
    ],
    "connections": {
      "route": { "primary": [
        [ { "node": "c0", "type": "primary", "index": 0 } ],
        [ { "node": "c1", "type": "primary", "index": 0 } ],
        [ { "node": "c2", "type": "primary", "index": 0 } ],
        [ { "node": "c3", "type": "primary", "index": 0 } ]
      ] },
      "c0": { "primary": [ [ { "node": "d0", "type": "primary", "index": 0 } ] ] }
    }
  }));

  let handler = MockHandler::new()
    .with_output(
      "route",
      vec![
        vec![item(json!({ "k": "a" })), item(json!({ "k": "b" }))],
        vec![],
        vec![item(json!({ "k": "c" }))],
        vec![],
      ],
    )
    .failing("c2");
  let recorder = handler.clone();

  let output = invoke(workflow, handler).await;

  assert_eq!(output.status, RunStatus::Success);
  assert!(output.error.is_none());

  // Active branches only.
  let calls = recorder.calls();
  assert!(calls.contains(&"c0".to_string()));
  assert!(calls.contains(&"c2".to_string()));
  assert!(!calls.contains(&"c1".to_string()));
  assert!(!calls.contains(&"c3".to_string()));

  // Branch 0 ran to completion despite branch 2 failing.
  assert!(output.run_data.contains_key("c0"));
  assert!(output.run_data.contains_key("d0"));
  assert!(!output.run_data.contains_key("c2"));
  assert_eq!(output.node_states["c2"], NodeState::Failed);
  assert_eq!(output.node_states["d0"], NodeState::Completed);

  // Each branch root got its own slice.
  assert_eq!(recorder.input_of("c0").expect("c0")[0].len(), 2);
  assert_eq!(recorder.input_of("c2").expect("c2")[0].len(), 1);
}

#[tokio::test]
async fn test_branch_descendants_aggregate_normally() {
  // Past the branch root, downstream nodes aggregate from their
  // parents as usual.
  let workflow = parse(json!({
    "id": "wf-deep",
    "name": "Deep Branch",
    "nodes": [
      { "id": "1", "name": "gate", "type": "core.if" },
      { "id": "2", "name": "t1", "type": "transform" },
      { "id": "3", "name": "t2", "type": "sql" }
    ],
    "connections": {
      "gate": { "primary": [
        [ { "node": "t1", "type": "primary", "index": 0 } ],
        []
      ] },
      "t1": { "primary": [ [ { "node": "t2", "type": "primary", "index": 0 } ] ] }
    }
  }));

  let handler = MockHandler::new()
    .with_output("gate", vec![vec![item(json!({ "v": 1 }))], vec![]])
    .with_output("t1", vec![vec![item(json!({ "v": 2 }))]]);
  let recorder = handler.clone();

  let output = invoke(workflow, handler).await;

  assert_eq!(output.status, RunStatus::Success);
  let t2_input = recorder.input_of("t2").expect("t2 was called");
  assert_eq!(t2_input[0][0].payload, json!({ "v": 2 }));
}

#[tokio::test]
async fn test_nested_conditionals_recurse() {
  let workflow = parse(json!({
    "id": "wf-nested",
    "name": "Nested",
    "nodes": [
      { "id": "1", "name": "outer", "type": "core.if" },
      { "id": "2", "name": "inner", "type": "core.if" },
      { "id": "3", "name": "deep", "type": "transform" },
      { "id": "4", "name": "dead", "type": "transform" }
    ],
    "connections": {
      "outer": { "primary": [
        [ { "node": "inner", "type": "primary", "index": 0 } ],
        []
      ] },
      "inner": { "primary": [
        [ { "node": "deep", "type": "primary", "index": 0 } ],
        [ { "node": "dead", "type": "primary", "index": 0 } ]
      ] }
    }
  }));

  let handler = MockHandler::new()
    .with_output("outer", vec![vec![item(json!({ "level": 1 }))], vec![]])
    .with_output("inner", vec![vec![item(json!({ "level": 2 }))], vec![]]);
  let recorder = handler.clone();

  let output = invoke(workflow, handler).await;

  assert_eq!(output.status, RunStatus::Success);
  assert!(output.run_data.contains_key("deep"));
  assert!(!output.run_data.contains_key("dead"));
  assert!(!recorder.calls().contains(&"dead".to_string()));

  let deep_input = recorder.input_of("deep").expect("deep was called");
  assert_eq!(deep_input[0][0].payload, json!({ "level": 2 }));
}

#[tokio::test]
async fn test_rejoin_after_both_branches_executes_once() {
  // Both gate outputs carry data and both feed the same sink. The sink
  // runs exactly once, claimed by the first branch to discover it.
  let workflow = parse(json!({
    "id": "wf-rejoin",
    "name": "Rejoin",
    "nodes": [
      { "id": "1", "name": "gate", "type": "core.if" },
      { "id": "2", "name": "merge", "type": "sql" }
    ],
    "connections": {
      "gate": { "primary": [
        [ { "node": "merge", "type": "primary", "index": 0 } ],
        [ { "node": "merge", "type": "primary", "index": 0 } ]
      ] }
    }
  }));

  let handler = MockHandler::new().with_output(
    "gate",
    vec![
      vec![item(json!({ "side": "true" }))],
      vec![item(json!({ "side": "false" }))],
    ],
  );
  let recorder = handler.clone();

  let output = invoke(workflow, handler).await;

  assert_eq!(output.status, RunStatus::Success);
  let merge_calls = recorder.calls().iter().filter(|n| *n == "merge").count();
  assert_eq!(merge_calls, 1);
}

#[tokio::test]
async fn test_all_slots_empty_runs_nothing_downstream() {
  let handler = MockHandler::new().with_output("gate", vec![vec![], vec![]]);
  let recorder = handler.clone();

  let output = invoke(gate_workflow(), handler).await;

  assert_eq!(output.status, RunStatus::Success);
  assert!(!output.run_data.contains_key("t1"));
  assert!(!output.run_data.contains_key("f1"));
  assert_eq!(recorder.calls(), ["src", "gate"]);
}

#[tokio::test]
async fn test_synthetic_stash_keys_absent_from_run_data() {
  let handler = MockHandler::new()
    .with_output("gate", vec![vec![item(json!({ "pass": true }))], vec![]]);

  let output = invoke(gate_workflow(), handler).await;

  for key in output.run_data.keys() {
    assert!(!key.contains('#'), "synthetic key leaked: {key}");
  }
}

#[tokio::test]
async fn test_failure_inside_branch_does_not_fail_workflow() {
  let handler = MockHandler::new()
    .with_output("gate", vec![vec![item(json!({ "pass": true }))], vec![]])
    .failing("t1");

  let output = invoke(gate_workflow(), handler).await;

  // Diverges from the non-branch policy on purpose: partial routing
  // failure is an accepted outcome of conditional fan-out.
  assert_eq!(output.status, RunStatus::Success);
  assert!(output.error.is_none());
  assert_eq!(output.node_states["t1"], NodeState::Failed);
}
