//! The compiled graph document
//!
//! Produced once per compile and immutable afterwards. Serializes to the
//! stable JSON shape consumed by CI systems and UIs.

use crate::action::{ActionRef, Assertion, Operation, Table, Test};
use crate::config::ProjectConfig;
use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A non-fatal validation failure recorded during compilation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{file_name}: {message}")]
pub struct CompileError {
    /// Source file of the offending declaration
    pub file_name: String,

    /// Action the error belongs to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,

    pub message: String,
}

/// Errors accumulated while compiling
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphErrors {
    #[serde(default)]
    pub compilation_errors: Vec<CompileError>,
}

impl GraphErrors {
    pub fn is_empty(&self) -> bool {
        self.compilation_errors.is_empty()
    }
}

/// Validated actions of each kind plus compile errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledGraph {
    pub project_config: ProjectConfig,

    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default)]
    pub operations: Vec<Operation>,

    #[serde(default)]
    pub assertions: Vec<Assertion>,

    #[serde(default)]
    pub tests: Vec<Test>,

    #[serde(default)]
    pub graph_errors: GraphErrors,
}

impl CompiledGraph {
    /// Whether any compile error was recorded
    pub fn has_errors(&self) -> bool {
        !self.graph_errors.is_empty()
    }

    /// Tables, operations and assertions: every action that can be a
    /// dependency target or an execution node
    pub fn executable_actions(&self) -> impl Iterator<Item = ActionRef<'_>> {
        self.tables
            .iter()
            .map(ActionRef::Table)
            .chain(self.operations.iter().map(ActionRef::Operation))
            .chain(self.assertions.iter().map(ActionRef::Assertion))
    }

    /// Every compiled action, tests included
    pub fn actions(&self) -> impl Iterator<Item = ActionRef<'_>> {
        self.executable_actions()
            .chain(self.tests.iter().map(ActionRef::Test))
    }

    /// Look up an executable action by name
    pub fn find(&self, name: &str) -> Option<ActionRef<'_>> {
        self.executable_actions().find(|a| a.name() == name)
    }

    /// Names of all dependency targets (tests excluded)
    pub fn action_names(&self) -> Vec<&str> {
        self.executable_actions().map(|a| a.name().as_str()).collect()
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
