//! Execution graph and executed graph records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wf_core::{ActionName, ActionType, CoreResult, ProjectConfig, RunConfig, Target, Task, WarehouseType};

/// Lifecycle of one execution node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    /// A dependency did not succeed
    Skipped,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Pending => write!(f, "pending"),
            NodeStatus::Running => write!(f, "running"),
            NodeStatus::Succeeded => write!(f, "succeeded"),
            NodeStatus::Failed => write!(f, "failed"),
            NodeStatus::Cancelled => write!(f, "cancelled"),
            NodeStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// One action selected for a run, with its generated tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub name: ActionName,
    pub action_type: ActionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    /// Dependencies restricted to the selected nodes
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Statements executed in order
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub status: NodeStatus,
}

/// The compiled graph narrowed to a run selection, with tasks attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionGraph {
    pub project_config: ProjectConfig,
    pub run_config: RunConfig,
    pub warehouse: WarehouseType,

    /// Statements run once before any node (schema creation)
    #[serde(default)]
    pub setup_tasks: Vec<Task>,

    /// Nodes in topological order
    pub nodes: Vec<ExecutionNode>,
}

impl ExecutionGraph {
    pub fn node(&self, name: &str) -> Option<&ExecutionNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Outcome of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: Task,
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn succeeded(task: Task) -> Self {
        Self {
            task,
            ok: true,
            error: None,
        }
    }

    pub fn failed(task: Task, error: impl Into<String>) -> Self {
        Self {
            task,
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Final state of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedNode {
    pub name: ActionName,
    pub status: NodeStatus,

    /// Results of the tasks that were attempted
    #[serde(default)]
    pub tasks: Vec<TaskResult>,

    /// When the node started running; absent for nodes that never ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub duration_ms: u64,

    /// Why the node failed or was cancelled mid-run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutedNode {
    /// A node that reached `status` without running
    pub fn not_run(name: ActionName, status: NodeStatus) -> Self {
        Self {
            name,
            status,
            tasks: Vec::new(),
            started_at: None,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Per-status node counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub skipped: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes: {} succeeded, {} failed, {} cancelled, {} skipped",
            self.total, self.succeeded, self.failed, self.cancelled, self.skipped
        )
    }
}

/// Report of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedGraph {
    /// Unique identifier for this run
    pub run_id: String,

    /// True iff setup succeeded and every node succeeded
    pub ok: bool,

    /// Whether the run was cancelled
    pub cancelled: bool,

    /// Warehouse failure that stopped the whole run, such as a lost connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,

    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,

    #[serde(default)]
    pub setup_tasks: Vec<TaskResult>,

    /// Nodes in execution graph order
    pub nodes: Vec<ExecutedNode>,
}

impl ExecutedGraph {
    pub fn node(&self, name: &str) -> Option<&ExecutedNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Status of `name`, if it was part of the run
    pub fn status(&self, name: &str) -> Option<NodeStatus> {
        self.node(name).map(|n| n.status)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.nodes.len(),
            ..RunSummary::default()
        };
        for node in &self.nodes {
            match node.status {
                NodeStatus::Succeeded => summary.succeeded += 1,
                NodeStatus::Failed => summary.failed += 1,
                NodeStatus::Cancelled => summary.cancelled += 1,
                NodeStatus::Skipped => summary.skipped += 1,
                NodeStatus::Pending | NodeStatus::Running => {}
            }
        }
        summary
    }

    pub fn failed_nodes(&self) -> Vec<&ExecutedNode> {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Failed)
            .collect()
    }

    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Status change of one node, streamed while a run is in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub name: ActionName,
    pub status: NodeStatus,
    pub at: DateTime<Utc>,
}

impl NodeEvent {
    pub fn new(name: ActionName, status: NodeStatus) -> Self {
        Self {
            name,
            status,
            at: Utc::now(),
        }
    }
}
