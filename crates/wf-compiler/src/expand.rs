//! Wildcard dependency expansion

use std::collections::BTreeSet;
use wf_core::pattern::{is_wildcard, match_patterns};
use wf_core::CompiledGraph;

/// Resolve one action's dependency patterns against the name universe
///
/// Literal names are kept whether or not they exist; wildcard patterns are
/// replaced by every matching name. The result is sorted and deduplicated,
/// so expanding an already expanded list returns it unchanged.
pub fn expand(dependencies: &[String], universe: &[String]) -> Vec<String> {
    let (wildcards, literals): (Vec<&str>, Vec<&str>) = dependencies
        .iter()
        .map(String::as_str)
        .partition(|d| is_wildcard(d));

    let mut resolved: BTreeSet<String> = literals.into_iter().map(str::to_string).collect();
    resolved.extend(match_patterns(
        wildcards,
        universe.iter().map(String::as_str),
    ));
    resolved.into_iter().collect()
}

/// Replace every action's dependencies with the expanded set
///
/// Tables, operations and assertions form the universe; tests are never
/// dependency targets.
pub fn expand_dependencies(graph: &mut CompiledGraph) {
    let universe: Vec<String> = graph
        .action_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    for table in &mut graph.tables {
        table.dependencies = expand(&table.dependencies, &universe);
    }
    for operation in &mut graph.operations {
        operation.dependencies = expand(&operation.dependencies, &universe);
    }
    for assertion in &mut graph.assertions {
        assertion.dependencies = expand(&assertion.dependencies, &universe);
    }
}

#[cfg(test)]
#[path = "expand_test.rs"]
mod tests;
