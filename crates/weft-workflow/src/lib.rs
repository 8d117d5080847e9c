//! Weft Workflow
//!
//! This crate provides the workflow graph model for weft: the node and
//! connection types of a workflow definition, the adjacency structure
//! built from them, and structural start-set resolution.
//!
//! A definition is a flat node list plus a connection table keyed by
//! source node name, connection kind, and source output index. Only
//! primary-kind connections participate in execution ordering; the
//! [`Graph`] built from a definition answers the child/parent queries
//! the execution driver needs.

mod connection;
mod error;
mod graph;
mod node;
mod workflow;

pub use connection::{ConnectionKind, ConnectionTable, ConnectionTarget};
pub use error::WorkflowError;
pub use graph::{Graph, ParentEdge};
pub use node::{Item, Node, NodeKind, OutputSlots};
pub use workflow::Workflow;
