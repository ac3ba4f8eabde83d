//! Remaining-dependency bookkeeping for the run coordinator

use crate::graph::ExecutionNode;
use std::collections::HashMap;

/// Counts unresolved dependencies per node, by position in the graph
///
/// Owned by the coordinator task alone; node executions report back through
/// their join handles and never touch it.
#[derive(Debug)]
pub(crate) struct ReadinessTracker {
    remaining: Vec<usize>,
    dependents: Vec<Vec<usize>>,
}

impl ReadinessTracker {
    pub(crate) fn new(nodes: &[ExecutionNode]) -> Self {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.as_str(), i))
            .collect();

        let mut remaining = vec![0; nodes.len()];
        let mut dependents = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for dep in &node.dependencies {
                if let Some(&d) = index.get(dep.as_str()) {
                    remaining[i] += 1;
                    dependents[d].push(i);
                }
            }
        }

        Self {
            remaining,
            dependents,
        }
    }

    /// Nodes with no dependencies, in graph order
    pub(crate) fn initially_ready(&self) -> Vec<usize> {
        self.remaining
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(i, _)| i)
            .collect()
    }

    /// Record that `node` reached a terminal state and return the dependents
    /// that became ready as a result
    pub(crate) fn complete(&mut self, node: usize) -> Vec<usize> {
        let Some(dependents) = self.dependents.get(node) else {
            return Vec::new();
        };
        let mut ready = Vec::new();
        for &d in dependents {
            if let Some(count) = self.remaining.get_mut(d) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.push(d);
                }
            }
        }
        ready
    }
}
