//! The execution driver.

use std::collections::{BTreeMap, VecDeque};

use futures::FutureExt;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use weft_activity::{ActivityCall, ActivityHandler};
use weft_workflow::{Graph, Item, Node, OutputSlots, Workflow};

use crate::branch;
use crate::context::{ExecutionContext, NodeState};
use crate::error::EngineError;
use crate::input;
use crate::result::{self, ExecutionOutput, RunStatus};

/// Where a queued node's input comes from.
#[derive(Debug, Clone)]
enum InputSource {
  /// Aggregate from executed parents.
  Parents,
  /// Exact slice stashed for one conditional branch.
  Branch(String),
}

/// One unit of pending work: a node and its input source. The queue is
/// drained strictly FIFO — pop order is part of the replayed history.
#[derive(Debug, Clone)]
struct QueueEntry {
  name: String,
  input: InputSource,
}

/// Parameters of one workflow invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
  /// Execution identifier, produced by the caller. The engine derives
  /// no identifiers of its own, so a replay sees the same values.
  pub execution_id: String,
  /// Designated start node, overriding structural resolution.
  pub start_node: Option<String>,
  /// Node after which traversal stops advancing. The destination
  /// itself still executes.
  pub destination_node: Option<String>,
  /// Pre-recorded outputs: nodes listed here commit their pinned
  /// items without an activity call.
  pub pin_data: BTreeMap<String, Vec<Item>>,
}

impl Invocation {
  pub fn new(execution_id: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      ..Default::default()
    }
  }
}

/// The workflow engine.
///
/// Holds one definition and an activity handler; [`Runtime::invoke`]
/// executes the graph once per call. All node processing goes through
/// the handler — the engine performs no I/O of its own.
pub struct Runtime<H> {
  workflow: Workflow,
  handler: H,
}

impl<H: ActivityHandler> Runtime<H> {
  pub fn new(workflow: Workflow, handler: H) -> Self {
    Self { workflow, handler }
  }

  /// Get a reference to the workflow.
  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  /// Execute the workflow.
  ///
  /// Never returns an error: every fatal condition is folded into the
  /// output's `status` and `error` fields, so the contract stays
  /// uniform for callers and for replay.
  #[instrument(
    name = "workflow_invoke",
    skip(self, invocation, cancel),
    fields(
      workflow_id = %self.workflow.id,
      execution_id = %invocation.execution_id,
    )
  )]
  pub async fn invoke(&self, invocation: Invocation, cancel: CancellationToken) -> ExecutionOutput {
    info!(workflow = %self.workflow.name, "workflow_started");

    let ctx = ExecutionContext::new();
    for node in &self.workflow.nodes {
      ctx.mark(&node.name, NodeState::Pending);
    }

    let outcome = self.run(&ctx, &invocation, &cancel).await;

    let node_states = ctx.states();
    let run_data = result::collect(&self.workflow, &ctx.into_results());

    match outcome {
      Ok(()) => {
        info!(nodes = run_data.len(), "workflow_completed");
        ExecutionOutput {
          execution_id: invocation.execution_id,
          run_data,
          status: RunStatus::Success,
          error: None,
          node_states,
        }
      }
      Err(e) => {
        error!(error = %e, "workflow_failed");
        ExecutionOutput {
          execution_id: invocation.execution_id,
          run_data,
          status: RunStatus::Error,
          error: Some(e.to_string()),
          node_states,
        }
      }
    }
  }

  /// Validate, resolve the start set, and drain the outer work queue.
  async fn run(
    &self,
    ctx: &ExecutionContext,
    inv: &Invocation,
    cancel: &CancellationToken,
  ) -> Result<(), EngineError> {
    self.workflow.validate()?;

    let graph = self.workflow.graph();

    let starts: Vec<String> = match &inv.start_node {
      Some(name) => {
        if self.workflow.get_node(name).is_none() {
          return Err(EngineError::UnknownStartNode(name.clone()));
        }
        vec![name.clone()]
      }
      None => graph.start_set().to_vec(),
    };

    if starts.is_empty() {
      return Err(EngineError::NoStartNode);
    }

    info!(start_set = ?starts, "start_set_resolved");

    let queue = starts
      .into_iter()
      .map(|name| QueueEntry {
        name,
        input: InputSource::Parents,
      })
      .collect();

    self.run_queue(&graph, ctx, inv, queue, cancel).await
  }

  /// Drain one FIFO work queue.
  ///
  /// The outer invocation runs one queue; every active branch of a
  /// conditional node runs its own. The claim set is shared, so a node
  /// reachable through several paths executes on whichever queue
  /// claims it first and is skipped everywhere else.
  fn run_queue<'a>(
    &'a self,
    graph: &'a Graph,
    ctx: &'a ExecutionContext,
    inv: &'a Invocation,
    mut queue: VecDeque<QueueEntry>,
    cancel: &'a CancellationToken,
  ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send + 'a {
    async move {
    while let Some(entry) = queue.pop_front() {
      if cancel.is_cancelled() {
        warn!("workflow cancelled");
        return Err(EngineError::Cancelled);
      }

      let Some(node) = self.workflow.get_node(&entry.name) else {
        warn!(node = %entry.name, "dangling_connection_skipped");
        continue;
      };

      if !ctx.claim(&node.name) {
        continue;
      }

      if node.disabled {
        ctx.mark(&node.name, NodeState::Skipped);
        info!(node = %node.name, "node_skipped");
        if !self.at_destination(inv, &node.name) {
          enqueue_children(graph, &mut queue, &node.name);
        }
        continue;
      }

      let slots = self.execute_node(graph, ctx, inv, node, &entry.input).await?;
      ctx.record(&node.name, slots.clone());
      ctx.mark(&node.name, NodeState::Completed);
      info!(node = %node.name, "node_completed");
      self.handler.checkpoint(&inv.execution_id, &node.name).await;

      if self.at_destination(inv, &node.name) {
        continue;
      }

      if node.is_conditional() {
        self
          .execute_branches(graph, ctx, inv, node, &slots, cancel)
          .await;
      } else {
        enqueue_children(graph, &mut queue, &node.name);
      }
    }

    Ok(())
    }
  }

  /// Produce one node's output slots: pinned data if present,
  /// otherwise one activity call with the aggregated (or overridden)
  /// input.
  async fn execute_node(
    &self,
    graph: &Graph,
    ctx: &ExecutionContext,
    inv: &Invocation,
    node: &Node,
    source: &InputSource,
  ) -> Result<OutputSlots, EngineError> {
    ctx.mark(&node.name, NodeState::Executing);

    if let Some(pinned) = inv.pin_data.get(&node.name) {
      info!(node = %node.name, items = pinned.len(), "node_pinned");
      return Ok(vec![pinned.clone()]);
    }

    let input = match source {
      InputSource::Parents => input::aggregate(graph, ctx, &node.name),
      InputSource::Branch(key) => ctx
        .output(key)
        .unwrap_or_else(|| vec![vec![Item::empty()]]),
    };

    info!(
      node = %node.name,
      items = input.iter().map(|slot| slot.len()).sum::<usize>(),
      "node_started"
    );

    let call = ActivityCall {
      node: node.clone(),
      input,
      invocation_id: inv.execution_id.clone(),
      caller_id: self.workflow.id.clone(),
    };

    match self.handler.call(call).await {
      Ok(output) => {
        if let Some(failure) = output.error {
          ctx.mark(&node.name, NodeState::Failed);
          error!(node = %failure.node_name, error = %failure.message, "node_failed");
          return Err(EngineError::NodeFailed {
            node: failure.node_name,
            message: failure.message,
          });
        }
        Ok(output.data)
      }
      Err(e) => {
        // Host gave up on delivery; treated exactly like a
        // node-reported error.
        ctx.mark(&node.name, NodeState::Failed);
        error!(node = %node.name, error = %e, "node_failed");
        Err(EngineError::NodeFailed {
          node: node.name.clone(),
          message: e.to_string(),
        })
      }
    }
  }

  /// Fan out over the active branches of a conditional node and join
  /// them before returning.
  ///
  /// Branches are enumerated in ascending output-index order and the
  /// joined futures are polled in that order, so the decision sequence
  /// is identical on every replay; only the activity I/O inside the
  /// branches overlaps. A failing branch is logged and isolated —
  /// siblings and the parent invocation continue.
  fn execute_branches<'a>(
    &'a self,
    graph: &'a Graph,
    ctx: &'a ExecutionContext,
    inv: &'a Invocation,
    node: &'a Node,
    slots: &'a OutputSlots,
    cancel: &'a CancellationToken,
  ) -> impl std::future::Future<Output = ()> + Send + 'a {
    async move {
    let active = branch::active_outputs(slots);
    if active.is_empty() {
      info!(node = %node.name, "no_active_branches");
      return;
    }

    info!(node = %node.name, branches = ?active, "branches_started");

    let mut branches = Vec::with_capacity(active.len());
    for index in active {
      let key = branch::stash_key(&node.name, index);
      ctx.record(&key, vec![slots[index].clone()]);

      let queue: VecDeque<QueueEntry> = graph
        .children_of_output(&node.name, index)
        .iter()
        .map(|child| QueueEntry {
          name: child.clone(),
          input: InputSource::Branch(key.clone()),
        })
        .collect();

      branches.push(
        async move { (index, self.run_queue(graph, ctx, inv, queue, cancel).await) }.boxed(),
      );
    }

    for (index, outcome) in join_all(branches).await {
      if let Err(e) = outcome {
        warn!(node = %node.name, output_index = index, error = %e, "branch_failed");
      }
    }
    }
  }

  fn at_destination(&self, inv: &Invocation, name: &str) -> bool {
    inv.destination_node.as_deref() == Some(name)
  }
}

/// Push a node's primary-kind children, ascending output index then
/// connection order. Duplicates are fine — the claim set filters them.
fn enqueue_children(graph: &Graph, queue: &mut VecDeque<QueueEntry>, name: &str) {
  for child in graph.children_of(name) {
    queue.push_back(QueueEntry {
      name: child,
      input: InputSource::Parents,
    });
  }
}
