//! Run-data collection and the invocation output.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use weft_workflow::{OutputSlots, Workflow};

use crate::context::NodeState;

/// One run-data entry: a node's output slots wrapped under the single
/// recognized bundle key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBundle {
  pub primary: OutputSlots,
}

/// Final per-node output artifact, keyed by node name. Sorted so the
/// serialized artifact is byte-identical across replays.
pub type RunData = BTreeMap<String, OutputBundle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Success,
  Error,
}

/// Result of a complete workflow invocation.
///
/// Failures are folded into `status`/`error`; nothing is raised past
/// the invocation boundary. `run_data` holds whatever committed before
/// a failure, so a partial run is still inspectable.
#[derive(Debug, Serialize)]
pub struct ExecutionOutput {
  pub execution_id: String,
  pub run_data: RunData,
  pub status: RunStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub node_states: BTreeMap<String, NodeState>,
}

/// Fold the raw result map into run data.
///
/// One entry per real node name, in definition order; synthetic
/// per-branch stash keys are dropped because they are not node names.
pub fn collect(workflow: &Workflow, results: &HashMap<String, OutputSlots>) -> RunData {
  workflow
    .nodes
    .iter()
    .filter_map(|node| {
      results.get(&node.name).map(|slots| {
        (
          node.name.clone(),
          OutputBundle {
            primary: slots.clone(),
          },
        )
      })
    })
    .collect()
}
