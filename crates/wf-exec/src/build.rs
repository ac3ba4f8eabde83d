//! Execution graph builder
//!
//! Narrows a compiled graph to the nodes selected by a [`RunConfig`] and
//! attaches the SQL tasks each node runs. Existing warehouse objects are
//! looked up through a [`MetadataLookup`] so adapters can choose between
//! rebuilding and appending.

use crate::error::{ExecError, ExecResult};
use crate::graph::{ExecutionGraph, ExecutionNode, NodeStatus};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use wf_adapters::Adapter;
use wf_core::pattern::{is_wildcard, match_patterns};
use wf_core::{ActionDag, ActionRef, CompiledGraph, RunConfig, Task};
use wf_db::MetadataLookup;

/// Build the execution graph for one run
///
/// Refuses to proceed when `graph` carries compile errors, when the run
/// configuration is inconsistent, or when compiled actions form a cycle.
pub async fn build<M>(
    graph: &CompiledGraph,
    run_config: &RunConfig,
    metadata: &M,
) -> ExecResult<ExecutionGraph>
where
    M: MetadataLookup + ?Sized,
{
    if graph.has_errors() {
        return Err(ExecError::CompilationErrors {
            errors: graph.graph_errors.compilation_errors.clone(),
        });
    }
    run_config.validate()?;

    let dependencies: BTreeMap<String, Vec<String>> = graph
        .executable_actions()
        .map(|a| (a.name().as_str().to_string(), a.dependencies().to_vec()))
        .collect();
    let dag = ActionDag::build(&dependencies)?;
    let selected = select_nodes(graph, run_config, &dag)?;

    let adapter = wf_adapters::create(&graph.project_config);
    let mut nodes = Vec::with_capacity(selected.len());
    for name in dag.topological_order()? {
        if !selected.contains(name.as_str()) {
            continue;
        }
        let Some(action) = graph.find(&name) else {
            continue;
        };

        let node_dependencies = action
            .dependencies()
            .iter()
            .filter(|dep| {
                if selected.contains(dep.as_str()) {
                    return true;
                }
                if !dag.contains(dep) {
                    warn!("{} depends on unknown action '{}', ignoring", name, dep);
                }
                false
            })
            .cloned()
            .collect();

        let tasks = action_tasks(action, adapter.as_ref(), run_config, metadata).await?;
        debug!("{}: {} task(s)", name, tasks.len());

        nodes.push(ExecutionNode {
            name: name.clone(),
            action_type: action.action_type(),
            target: action.target().cloned(),
            dependencies: node_dependencies,
            tags: action.tags().to_vec(),
            tasks,
            status: NodeStatus::Pending,
        });
    }

    let setup_tasks = setup_tasks(&nodes, adapter.as_ref());
    info!(
        "Built execution graph: {} of {} action(s) selected, {} schema(s) to prepare",
        nodes.len(),
        dependencies.len(),
        setup_tasks.len()
    );

    Ok(ExecutionGraph {
        project_config: graph.project_config.clone(),
        run_config: run_config.clone(),
        warehouse: adapter.warehouse(),
        setup_tasks,
        nodes,
    })
}

/// Names of the actions a run covers
///
/// Without explicit nodes every action runs. Literal names must exist;
/// patterns may match nothing. Disabled tables never run.
fn select_nodes(
    graph: &CompiledGraph,
    run_config: &RunConfig,
    dag: &ActionDag,
) -> ExecResult<BTreeSet<String>> {
    let names = graph.action_names();

    let mut selected: BTreeSet<String> = if run_config.nodes.is_empty() {
        names.iter().map(|n| n.to_string()).collect()
    } else {
        let mut selected = BTreeSet::new();
        for node in run_config.nodes.iter().filter(|n| !is_wildcard(n)) {
            if !dag.contains(node) {
                return Err(ExecError::NodeNotFound { name: node.clone() });
            }
            selected.insert(node.clone());
        }
        selected.extend(match_patterns(
            run_config
                .nodes
                .iter()
                .map(String::as_str)
                .filter(|n| is_wildcard(n)),
            names.iter().copied(),
        ));

        if run_config.include_dependencies {
            let ancestors: Vec<String> = selected
                .iter()
                .flat_map(|n| dag.ancestors(n))
                .map(|n| n.as_str().to_string())
                .collect();
            selected.extend(ancestors);
        }
        selected
    };

    selected.retain(|name| match graph.find(name) {
        Some(action) if action.is_disabled() => {
            debug!("Skipping disabled action {}", name);
            false
        }
        Some(_) => true,
        None => false,
    });
    Ok(selected)
}

async fn action_tasks<M>(
    action: ActionRef<'_>,
    adapter: &dyn Adapter,
    run_config: &RunConfig,
    metadata: &M,
) -> ExecResult<Vec<Task>>
where
    M: MetadataLookup + ?Sized,
{
    match action {
        ActionRef::Table(table) => {
            let existing = metadata.describe(&table.target).await.map_err(|source| {
                ExecError::MetadataLookup {
                    target: table.target.to_string(),
                    source,
                }
            })?;
            Ok(adapter
                .publish_tasks(table, run_config, existing.as_ref())
                .build())
        }
        ActionRef::Operation(operation) => {
            Ok(operation.queries.iter().map(Task::statement).collect())
        }
        ActionRef::Assertion(assertion) => Ok(adapter.assert_tasks(assertion).build()),
        ActionRef::Test(_) => Ok(Vec::new()),
    }
}

/// One `create schema` per distinct schema written by the run
fn setup_tasks(nodes: &[ExecutionNode], adapter: &dyn Adapter) -> Vec<Task> {
    let schemas: BTreeSet<(Option<&str>, &str)> = nodes
        .iter()
        .filter_map(|n| n.target.as_ref())
        .map(|t| (t.database.as_deref(), t.schema.as_str()))
        .collect();
    schemas
        .into_iter()
        .map(|(database, schema)| adapter.create_schema_task(schema, database))
        .collect()
}

#[cfg(test)]
#[path = "build_test.rs"]
mod tests;
