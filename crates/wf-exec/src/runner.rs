//! Concurrent DAG runner
//!
//! A single coordinator task owns the readiness bookkeeping and every node's
//! final state. Ready nodes are spawned onto a [`JoinSet`] and run
//! concurrently against one shared [`Database`]; within a node, tasks run in
//! order and the first failure stops the node.
//!
//! Cancellation is a [`CancellationToken`] shared by the coordinator and
//! every node. Nodes that have not started when it fires finish as
//! [`NodeStatus::Cancelled`]; running nodes issue no further statements and
//! pass the token to the driver so an in-flight statement can be aborted.
//!
//! A lost connection is not a node failure: the coordinator stops the rest of
//! the run and [`RunHandle::result`] reports [`ExecError::RunAborted`].

use crate::error::{ExecError, ExecResult};
use crate::graph::{
    ExecutedGraph, ExecutedNode, ExecutionGraph, ExecutionNode, NodeEvent, NodeStatus, TaskResult,
};
use crate::readiness::ReadinessTracker;
use chrono::Utc;
use futures::FutureExt;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wf_core::{ActionName, Task, TaskType};
use wf_db::{Database, DbError, QueryResult};

type EventSender = mpsc::UnboundedSender<NodeEvent>;

/// A run in progress
///
/// Dropping the handle does not stop the run; call [`RunHandle::cancel`].
pub struct RunHandle {
    cancel: CancellationToken,
    events: Option<mpsc::UnboundedReceiver<NodeEvent>>,
    join: JoinHandle<ExecutedGraph>,
}

impl RunHandle {
    /// Request cancellation of the whole run
    pub fn cancel(&self) {
        info!("Cancellation requested");
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Take the stream of node status changes; `None` after the first call
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<NodeEvent>> {
        self.events.take()
    }

    /// Wait for every node to reach a terminal state
    pub async fn result(self) -> ExecResult<ExecutedGraph> {
        let executed = self.join.await.map_err(|e| ExecError::Join(e.to_string()))?;
        match executed.fatal_error.clone() {
            Some(reason) => Err(ExecError::RunAborted {
                reason,
                executed: Box::new(executed),
            }),
            None => Ok(executed),
        }
    }
}

/// Start running `graph` against `db`
///
/// Must be called from within a tokio runtime.
pub fn run(graph: ExecutionGraph, db: Arc<dyn Database>) -> RunHandle {
    run_with_token(graph, db, CancellationToken::new())
}

/// Start running `graph`, cancelled when `cancel` fires
///
/// Useful for tying a run to a wider shutdown signal.
pub fn run_with_token(
    graph: ExecutionGraph,
    db: Arc<dyn Database>,
    cancel: CancellationToken,
) -> RunHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let coordinator = Coordinator {
        graph,
        db,
        abort: cancel.child_token(),
        cancel: cancel.clone(),
        events: events_tx,
    };
    let join = tokio::spawn(coordinator.run());
    RunHandle {
        cancel,
        events: Some(events_rx),
        join,
    }
}

struct Coordinator {
    graph: ExecutionGraph,
    db: Arc<dyn Database>,
    /// Caller's token
    cancel: CancellationToken,
    /// Fires on caller cancellation or a fatal warehouse error; nodes watch this one
    abort: CancellationToken,
    events: EventSender,
}

impl Coordinator {
    async fn run(self) -> ExecutedGraph {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(
            "Run {} started: {} node(s) on {} ({})",
            run_id,
            self.graph.nodes.len(),
            self.graph.warehouse,
            self.db.db_type()
        );

        let (setup_results, setup_failure) = self.run_setup().await;
        let setup_ok = setup_failure.is_none();
        let mut fatal_error = match setup_failure {
            Some(TaskFailure::Fatal(message)) => Some(message),
            _ => None,
        };
        let finished = if setup_ok {
            let (finished, fatal) = self.schedule().await;
            fatal_error = fatal;
            finished
        } else {
            let status = if self.cancel.is_cancelled() {
                NodeStatus::Cancelled
            } else {
                NodeStatus::Skipped
            };
            warn!("Setup did not complete, marking every node {}", status);
            self.graph
                .nodes
                .iter()
                .map(|node| Some(self.finish(ExecutedNode::not_run(node.name.clone(), status))))
                .collect()
        };

        let nodes: Vec<ExecutedNode> = self
            .graph
            .nodes
            .iter()
            .zip(finished)
            .map(|(node, state)| state.unwrap_or_else(|| self.unresolved(node)))
            .collect();

        let any_cancelled = nodes.iter().any(|n| n.status == NodeStatus::Cancelled);
        let executed = ExecutedGraph {
            ok: setup_ok
                && fatal_error.is_none()
                && nodes.iter().all(|n| n.status == NodeStatus::Succeeded),
            cancelled: self.cancel.is_cancelled() || (fatal_error.is_none() && any_cancelled),
            fatal_error,
            run_id,
            started_at,
            ended_at: Utc::now(),
            setup_tasks: setup_results,
            nodes,
        };
        info!(
            "Run {} finished ({}): {}",
            executed.run_id,
            if executed.ok { "ok" } else { "not ok" },
            executed.summary()
        );
        executed
    }

    /// Run schema preparation in order, stopping at the first failure
    async fn run_setup(&self) -> (Vec<TaskResult>, Option<TaskFailure>) {
        let mut results = Vec::with_capacity(self.graph.setup_tasks.len());
        for task in &self.graph.setup_tasks {
            if self.cancel.is_cancelled() {
                return (results, Some(TaskFailure::Cancelled("run cancelled".to_string())));
            }
            debug!("setup: {}", task.statement);
            match run_task(self.db.as_ref(), task, &self.cancel).await {
                Ok(()) => results.push(TaskResult::succeeded(task.clone())),
                Err(failure) => {
                    error!("Setup task failed: {}", failure.message());
                    results.push(TaskResult::failed(task.clone(), failure.message()));
                    return (results, Some(failure));
                }
            }
        }
        (results, None)
    }

    /// Dispatch nodes as their dependencies resolve until none remain
    ///
    /// Also returns the first fatal warehouse error, after which nothing new
    /// is dispatched.
    async fn schedule(&self) -> (Vec<Option<ExecutedNode>>, Option<String>) {
        let nodes = &self.graph.nodes;
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.as_str(), i))
            .collect();

        let mut finished: Vec<Option<ExecutedNode>> = vec![None; nodes.len()];
        let mut tracker = ReadinessTracker::new(nodes);
        let mut ready: VecDeque<usize> = tracker.initially_ready().into();
        let mut dispatched = vec![false; nodes.len()];
        let mut running = JoinSet::new();
        let mut fatal: Option<String> = None;

        loop {
            while let Some(idx) = ready.pop_front() {
                let node = &nodes[idx];

                if self.abort.is_cancelled() {
                    let status = if self.cancel.is_cancelled() {
                        NodeStatus::Cancelled
                    } else {
                        NodeStatus::Skipped
                    };
                    finished[idx] = Some(self.finish(ExecutedNode::not_run(node.name.clone(), status)));
                    ready.extend(tracker.complete(idx));
                    continue;
                }

                let blocked_by = node.dependencies.iter().find(|dep| {
                    index
                        .get(dep.as_str())
                        .and_then(|&d| finished[d].as_ref())
                        .is_some_and(|n| n.status != NodeStatus::Succeeded)
                });
                if let Some(dep) = blocked_by {
                    debug!("{} skipped: dependency {} did not succeed", node.name, dep);
                    finished[idx] =
                        Some(self.finish(ExecutedNode::not_run(node.name.clone(), NodeStatus::Skipped)));
                    ready.extend(tracker.complete(idx));
                    continue;
                }

                let execution = execute_node(
                    node.clone(),
                    Arc::clone(&self.db),
                    self.abort.clone(),
                    self.events.clone(),
                );
                let name = node.name.clone();
                dispatched[idx] = true;
                running.spawn(async move {
                    let outcome = AssertUnwindSafe(execution).catch_unwind().await;
                    (idx, outcome.unwrap_or_else(|panic| (panicked(name, panic), None)))
                });
            }

            match running.join_next().await {
                None => break,
                Some(Ok((idx, (executed, node_fatal)))) => {
                    if let Some(message) = node_fatal {
                        if fatal.is_none() {
                            error!("Warehouse unusable, aborting run: {}", message);
                            fatal = Some(message);
                            self.abort.cancel();
                        }
                    }
                    finished[idx] = Some(self.finish(executed));
                    ready.extend(tracker.complete(idx));
                }
                Some(Err(e)) => {
                    // The node's index is lost with its task; the final sweep
                    // resolves it and its dependents.
                    error!("Node task failed to join: {}", e);
                }
            }
        }

        for (idx, state) in finished.iter_mut().enumerate() {
            if state.is_none() && dispatched[idx] {
                *state = Some(self.finish(ExecutedNode {
                    error: Some("node task did not complete".to_string()),
                    ..ExecutedNode::not_run(nodes[idx].name.clone(), NodeStatus::Failed)
                }));
            }
        }
        (finished, fatal)
    }

    /// Report a node's terminal state and hand it back
    fn finish(&self, executed: ExecutedNode) -> ExecutedNode {
        match executed.status {
            NodeStatus::Failed => warn!(
                "{} failed: {}",
                executed.name,
                executed.error.as_deref().unwrap_or("unknown error")
            ),
            status => debug!("{} {} ({}ms)", executed.name, status, executed.duration_ms),
        }
        send(&self.events, NodeEvent::new(executed.name.clone(), executed.status));
        executed
    }

    /// Terminal state for a node the scheduler never resolved
    fn unresolved(&self, node: &ExecutionNode) -> ExecutedNode {
        let status = if self.cancel.is_cancelled() {
            NodeStatus::Cancelled
        } else {
            NodeStatus::Skipped
        };
        self.finish(ExecutedNode::not_run(node.name.clone(), status))
    }
}

fn send(events: &EventSender, event: NodeEvent) {
    // Nobody listening is fine.
    let _ = events.send(event);
}

fn panicked(name: ActionName, panic: Box<dyn std::any::Any + Send>) -> ExecutedNode {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ExecutedNode {
        error: Some(format!("node panicked: {}", message)),
        ..ExecutedNode::not_run(name, NodeStatus::Failed)
    }
}

/// Run one node's tasks in order
///
/// The second value carries a fatal warehouse error, if one stopped the node.
async fn execute_node(
    node: ExecutionNode,
    db: Arc<dyn Database>,
    cancel: CancellationToken,
    events: EventSender,
) -> (ExecutedNode, Option<String>) {
    let started_at = Utc::now();
    let start = Instant::now();
    send(&events, NodeEvent::new(node.name.clone(), NodeStatus::Running));
    debug!("{} running ({} task(s))", node.name, node.tasks.len());

    let mut status = NodeStatus::Succeeded;
    let mut error = None;
    let mut fatal = None;
    let mut results = Vec::with_capacity(node.tasks.len());
    for task in node.tasks {
        if cancel.is_cancelled() {
            status = NodeStatus::Cancelled;
            error = Some("run cancelled".to_string());
            break;
        }
        match run_task(db.as_ref(), &task, &cancel).await {
            Ok(()) => results.push(TaskResult::succeeded(task)),
            Err(failure) => {
                status = match &failure {
                    TaskFailure::Cancelled(_) => NodeStatus::Cancelled,
                    TaskFailure::Failed(_) => NodeStatus::Failed,
                    TaskFailure::Fatal(message) => {
                        fatal = Some(message.clone());
                        NodeStatus::Failed
                    }
                };
                error = Some(failure.message().to_string());
                results.push(TaskResult::failed(task, failure.message()));
                break;
            }
        }
    }

    let executed = ExecutedNode {
        name: node.name,
        status,
        tasks: results,
        started_at: Some(started_at),
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    };
    (executed, fatal)
}

#[derive(Debug)]
enum TaskFailure {
    Cancelled(String),
    Failed(String),
    /// The warehouse itself is unusable; no further statement can succeed
    Fatal(String),
}

impl TaskFailure {
    fn message(&self) -> &str {
        match self {
            TaskFailure::Cancelled(m) | TaskFailure::Failed(m) | TaskFailure::Fatal(m) => m,
        }
    }
}

impl From<DbError> for TaskFailure {
    fn from(err: DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::Cancelled(_) => TaskFailure::Cancelled(message),
            DbError::ConnectionError(_) | DbError::MutexPoisoned(_) => TaskFailure::Fatal(message),
            _ => TaskFailure::Failed(message),
        }
    }
}

async fn run_task(
    db: &dyn Database,
    task: &Task,
    cancel: &CancellationToken,
) -> Result<(), TaskFailure> {
    let result = db.execute_cancellable(&task.statement, cancel).await?;
    match task.task_type {
        TaskType::Statement => Ok(()),
        TaskType::Assertion => match offending_rows(&result) {
            Ok(0) => Ok(()),
            Ok(count) => Err(TaskFailure::Failed(format!(
                "Assertion failed: query returned {} row(s)",
                count
            ))),
            Err(message) => Err(TaskFailure::Failed(message)),
        },
    }
}

/// Offending-row count from an assertion check; NULL counts as zero
fn offending_rows(result: &QueryResult) -> Result<i64, String> {
    match result.scalar() {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| format!("Assertion returned an invalid row count: {}", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("Assertion returned a non-numeric row count: {}", s)),
        Some(other) => Err(format!(
            "Assertion returned a non-numeric row count: {}",
            other
        )),
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
