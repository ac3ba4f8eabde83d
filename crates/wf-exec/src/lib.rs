//! wf-exec - Execution layer for Weft
//!
//! [`build`] narrows a compiled graph to the actions selected for a run and
//! attaches the SQL each one executes; [`run`] executes that graph against a
//! warehouse connection, running independent nodes concurrently.

pub mod build;
pub mod error;
pub mod graph;
mod readiness;
pub mod runner;

pub use build::build;
pub use error::{ExecError, ExecResult};
pub use graph::{
    ExecutedGraph, ExecutedNode, ExecutionGraph, ExecutionNode, NodeEvent, NodeStatus, RunSummary,
    TaskResult,
};
pub use runner::{run, run_with_token, RunHandle};
