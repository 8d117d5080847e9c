//! Weft Runtime
//!
//! The deterministic execution engine. [`Runtime::invoke`] walks a
//! workflow graph breadth-first from its start set, calls the activity
//! boundary once per reachable node, threads output data downstream,
//! and fans conditional gate/switch nodes out into isolated parallel
//! branches.
//!
//! The engine is written to run under a durable-execution host that
//! replays it from recorded history after a crash: all scheduling
//! decisions (visit order, branch enumeration, input aggregation) are
//! pure functions of the definition and the recorded activity outputs.
//! Control yields only at activity calls and at the post-commit
//! checkpoint hook; branch "parallelism" is cooperative fan-out joined
//! in ascending output-index order, so two replays of the same history
//! agree on every decision.

mod branch;
mod context;
mod error;
mod input;
mod result;
mod runtime;

pub use context::{ExecutionContext, NodeState};
pub use error::EngineError;
pub use result::{ExecutionOutput, OutputBundle, RunData, RunStatus};
pub use runtime::{Invocation, Runtime};
