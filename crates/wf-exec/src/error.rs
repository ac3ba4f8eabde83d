//! Error types for wf-exec

use crate::graph::ExecutedGraph;
use thiserror::Error;
use wf_core::{CompileError, CoreError};
use wf_db::DbError;

/// Build and run level failures
///
/// Failures of individual statements are not errors at this level; they are
/// recorded against their task and node in the executed graph.
#[derive(Error, Debug)]
pub enum ExecError {
    /// X001: The compiled graph carries compile errors
    #[error("[X001] Compiled graph has {} compilation error(s); first: {}", .errors.len(), first_error(.errors))]
    CompilationErrors { errors: Vec<CompileError> },

    /// X002: Invalid run configuration
    #[error("[X002] Invalid run config: {0}")]
    InvalidRunConfig(String),

    /// X003: Dependency cycle among compiled actions
    #[error("[X003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// X004: A literal node selection names no action
    #[error("[X004] Selected node not found: {name}")]
    NodeNotFound { name: String },

    /// X005: Metadata lookup failed
    #[error("[X005] Failed to describe {target}: {source}")]
    MetadataLookup {
        target: String,
        #[source]
        source: DbError,
    },

    /// X006: The run coordinator could not be joined
    #[error("[X006] Run coordinator failed: {0}")]
    Join(String),

    /// X007: The warehouse became unusable mid-run; the partial report is kept
    #[error("[X007] Run aborted: {reason}")]
    RunAborted {
        reason: String,
        executed: Box<ExecutedGraph>,
    },

    /// Core library error
    #[error(transparent)]
    Core(CoreError),
}

fn first_error(errors: &[CompileError]) -> String {
    errors
        .first()
        .map(|e| e.to_string())
        .unwrap_or_default()
}

impl From<CoreError> for ExecError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CircularDependency { cycle } => ExecError::CircularDependency { cycle },
            CoreError::RunConfigInvalid { message } => ExecError::InvalidRunConfig(message),
            other => ExecError::Core(other),
        }
    }
}

/// Result type alias for ExecError
pub type ExecResult<T> = Result<T, ExecError>;
