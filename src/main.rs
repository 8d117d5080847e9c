use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use weft_activity::{
  ActivityCall, ActivityError, ActivityHandler, ActivityOutput, RetryPolicy, RetryRunner,
};
use weft_runtime::{Invocation, RunStatus, Runtime};
use weft_workflow::{Item, NodeKind, Workflow};

/// Weft - deterministic workflow graph execution
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow definition against the local development handler
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Designated start node (defaults to structural resolution)
    #[arg(long)]
    start: Option<String>,

    /// Stop advancing past this node
    #[arg(long)]
    destination: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
    )
    .with_target(false)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Some(Commands::Run {
      workflow_file,
      start,
      destination,
    }) => {
      run_workflow(workflow_file, start, destination)?;
    }
    None => {
      println!("weft - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_workflow(
  workflow_file: PathBuf,
  start: Option<String>,
  destination: Option<String>,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_workflow_async(workflow_file, start, destination).await })
}

async fn run_workflow_async(
  workflow_file: PathBuf,
  start: Option<String>,
  destination: Option<String>,
) -> Result<()> {
  let content = tokio::fs::read_to_string(&workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let workflow: Workflow = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  eprintln!(
    "Loaded workflow: {} ({} nodes)",
    workflow.name,
    workflow.nodes.len()
  );

  // Read seed payload from stdin
  let payload = read_payload_from_stdin()?;

  let cancel = CancellationToken::new();
  let handler = RetryRunner::new(DevHandler, RetryPolicy::default(), cancel.clone());
  let runtime = Runtime::new(workflow, handler);

  // The execution id is minted here, outside the deterministic engine.
  let mut invocation = Invocation::new(uuid::Uuid::new_v4().to_string());
  invocation.start_node = start;
  invocation.destination_node = destination;

  // Seed the start set: the payload becomes the pinned output of every
  // start node, the same way a trigger payload enters a hosted run.
  let seed = payload_items(payload);
  if !seed.is_empty() {
    let starts: Vec<String> = match &invocation.start_node {
      Some(name) => vec![name.clone()],
      None => runtime.workflow().graph().start_set().to_vec(),
    };
    for name in starts {
      invocation.pin_data.insert(name, seed.clone());
    }
  }

  let output = runtime.invoke(invocation, cancel).await;

  eprintln!("Execution completed: {}", output.execution_id);
  eprintln!("Nodes in run data: {}", output.run_data.len());

  println!("{}", serde_json::to_string_pretty(&output.run_data)?);

  if output.status == RunStatus::Error {
    anyhow::bail!(
      "workflow failed: {}",
      output.error.unwrap_or_else(|| "unknown error".to_string())
    );
  }

  Ok(())
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, no seed data
    Ok(serde_json::Value::Null)
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read payload from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::Value::Null)
    } else {
      serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
    }
  }
}

fn payload_items(payload: serde_json::Value) -> Vec<Item> {
  match payload {
    serde_json::Value::Null => Vec::new(),
    serde_json::Value::Array(values) => values.into_iter().map(Item::new).collect(),
    value => vec![Item::new(value)],
  }
}

/// Local development handler.
///
/// Standard nodes echo their input; gate and switch nodes route every
/// item to the output slot named by their `route` parameter; a `fail`
/// parameter turns the node into an injected failure. Enough to run
/// definitions end-to-end without a durable-execution host.
struct DevHandler;

impl ActivityHandler for DevHandler {
  async fn call(&self, call: ActivityCall) -> Result<ActivityOutput, ActivityError> {
    let items: Vec<Item> = call.input.into_iter().flatten().collect();

    if let Some(message) = call.node.parameters.get("fail").and_then(|v| v.as_str()) {
      return Ok(ActivityOutput::failed(call.node.name, message));
    }

    match call.node.kind() {
      NodeKind::Gate | NodeKind::Switch => {
        let route = call
          .node
          .parameters
          .get("route")
          .and_then(|v| v.as_u64())
          .unwrap_or(0) as usize;
        let width = match call.node.kind() {
          NodeKind::Gate => 2,
          _ => route + 1,
        };

        let mut slots = vec![Vec::new(); width.max(route + 1)];
        slots[route] = items;
        Ok(ActivityOutput::slots(slots))
      }
      _ => Ok(ActivityOutput::single(items)),
    }
  }
}
