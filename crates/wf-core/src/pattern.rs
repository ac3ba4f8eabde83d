//! Wildcard name patterns
//!
//! Dependency and node-selection patterns use `*` as the only metacharacter.
//! Names are split into `.`-separated segments and `*` matches any substring
//! within a single segment.

use regex::Regex;
use std::collections::BTreeSet;

/// Whether `pattern` contains a wildcard
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains('*')
}

/// A compiled wildcard pattern
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a pattern. Everything except `*` matches literally.
    pub fn new(pattern: &str) -> Option<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[^.]*");
        match Regex::new(&format!("^{}$", body)) {
            Ok(regex) => Some(Self {
                source: pattern.to_string(),
                regex,
            }),
            Err(e) => {
                log::warn!("Ignoring invalid wildcard pattern '{}': {}", pattern, e);
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Match every wildcard pattern against `names`, returning the sorted union
/// of matched names.
///
/// The result depends only on the two input sets, never on their order.
pub fn match_patterns<'a, P, N>(patterns: P, names: N) -> BTreeSet<String>
where
    P: IntoIterator<Item = &'a str>,
    N: IntoIterator<Item = &'a str>,
{
    let compiled: Vec<WildcardPattern> = patterns
        .into_iter()
        .filter_map(WildcardPattern::new)
        .collect();
    if compiled.is_empty() {
        return BTreeSet::new();
    }
    names
        .into_iter()
        .filter(|name| compiled.iter().any(|p| p.matches(name)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod tests;
