//! Action dependency DAG and topological sorting

use crate::action_name::ActionName;
use crate::error::{CoreError, CoreResult};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Dependency graph over the actions of one compiled project
///
/// Built once per execution graph build; construction fails on a cycle, so a
/// held `ActionDag` always has a topological order.
#[derive(Debug)]
pub struct ActionDag {
    /// Edges run from dependency to dependent
    graph: DiGraph<ActionName, ()>,
    index: HashMap<ActionName, NodeIndex>,
}

impl ActionDag {
    /// Build from action name -> declared dependencies
    ///
    /// Dependencies that are not themselves keys of the map are external to
    /// the graph and produce no edge.
    pub fn build(dependencies: &BTreeMap<String, Vec<String>>) -> CoreResult<Self> {
        let mut dag = Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        };

        for action in dependencies.keys() {
            dag.node(action)?;
        }
        for (action, deps) in dependencies {
            let dependent = dag.node(action)?;
            for dep in deps.iter().filter(|d| dependencies.contains_key(*d)) {
                let dependency = dag.node(dep)?;
                dag.graph.update_edge(dependency, dependent, ());
            }
        }

        dag.sorted()?;
        Ok(dag)
    }

    fn node(&mut self, name: &str) -> CoreResult<NodeIndex> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }
        let name = ActionName::try_new(name).ok_or_else(|| CoreError::EmptyName {
            context: "action name in DAG".into(),
        })?;
        let idx = self.graph.add_node(name.clone());
        self.index.insert(name, idx);
        Ok(idx)
    }

    fn sorted(&self) -> CoreResult<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|cycle| CoreError::CircularDependency {
            cycle: self.cycle_through(cycle.node_id()),
        })
    }

    /// `a -> b -> a` rendering of a cycle that passes through `start`
    fn cycle_through(&self, start: NodeIndex) -> String {
        let mut path = vec![self.graph[start].to_string()];
        let mut seen = HashSet::from([start]);
        let mut current = start;

        while let Some(edge) = self.graph.edges(current).next() {
            let next = edge.target();
            path.push(self.graph[next].to_string());
            if !seen.insert(next) {
                break;
            }
            current = next;
        }

        path.join(" -> ")
    }

    /// Actions with every dependency ahead of its dependents
    pub fn topological_order(&self) -> CoreResult<Vec<ActionName>> {
        Ok(self
            .sorted()?
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Transitive dependencies of `action`; empty for unknown names
    pub fn ancestors(&self, action: &str) -> Vec<ActionName> {
        let Some(&start) = self.index.get(action) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for edge in self.graph.edges_directed(current, Direction::Incoming) {
                let dependency = edge.source();
                if seen.insert(dependency) {
                    found.push(self.graph[dependency].clone());
                    stack.push(dependency);
                }
            }
        }
        found
    }

    pub fn contains(&self, action: &str) -> bool {
        self.index.contains_key(action)
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
