//! Compiled action records
//!
//! Every declared unit of work compiles into exactly one of four records:
//! [`Table`] (views, tables, inline and incremental tables), [`Operation`],
//! [`Assertion`] or [`Test`]. [`ActionRef`] is a borrowed, closed view over
//! the four so decision points can match exhaustively.

use crate::action_name::ActionName;
use crate::metadata::RelationType;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dataset flavour of a [`Table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// Plain view
    View,
    /// Fully rebuilt table
    #[default]
    Table,
    /// Inlined into dependents; materialized as a view when run directly
    Inline,
    /// Table that appends new rows once it exists
    Incremental,
}

impl TableType {
    /// The warehouse object kind this dataset materializes as
    pub fn base_relation(self) -> RelationType {
        match self {
            TableType::View | TableType::Inline => RelationType::View,
            TableType::Table | TableType::Incremental => RelationType::Table,
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableType::View => write!(f, "view"),
            TableType::Table => write!(f, "table"),
            TableType::Inline => write!(f, "inline"),
            TableType::Incremental => write!(f, "incremental"),
        }
    }
}

/// Which registry an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Table,
    Operation,
    Assertion,
    Test,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Table => write!(f, "table"),
            ActionType::Operation => write!(f, "operation"),
            ActionType::Assertion => write!(f, "assertion"),
            ActionType::Test => write!(f, "test"),
        }
    }
}

/// Redshift physical layout options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedshiftOptions {
    /// Distribution key column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_key: Option<String>,

    /// Distribution style (`even`, `key`, `all`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_style: Option<String>,

    /// Sort key columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_keys: Vec<String>,

    /// Sort style (`compound`, `interleaved`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_style: Option<String>,
}

/// BigQuery physical layout options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigQueryOptions {
    /// Partitioning expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_by: Option<String>,

    /// Clustering columns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_by: Vec<String>,
}

/// A dataset: view, table, inline or incremental table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: ActionName,
    pub target: Target,

    #[serde(rename = "type")]
    pub table_type: TableType,

    /// SELECT producing the dataset
    pub query: String,

    /// SELECT used when appending to an existing incremental table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_query: Option<String>,

    /// Row predicate applied when writing incrementally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    /// Incremental predicate (`incremental_where`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_where: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_ops: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_ops: Vec<String>,

    /// Dependency names; wildcard patterns before expansion
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub protected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<RedshiftOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bigquery: Option<BigQueryOptions>,

    /// Source file the action was declared in
    pub file_name: String,
}

/// Arbitrary SQL statements, optionally producing an output relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: ActionName,

    /// Present only when `has_output` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    #[serde(default)]
    pub has_output: bool,

    /// Statements executed in order
    pub queries: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub file_name: String,
}

/// A query selecting offending rows; passes when it returns none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub name: ActionName,
    pub target: Target,
    pub query: String,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub file_name: String,
}

/// A unit test of one dataset against fixed input fixtures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub name: ActionName,

    /// Name of the dataset under test
    pub dataset: String,

    /// Expected output query
    pub query: String,

    /// Fixture queries keyed by the name they replace
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,

    pub file_name: String,
}

/// Borrowed view over any compiled action
#[derive(Debug, Clone, Copy)]
pub enum ActionRef<'a> {
    Table(&'a Table),
    Operation(&'a Operation),
    Assertion(&'a Assertion),
    Test(&'a Test),
}

impl<'a> ActionRef<'a> {
    pub fn name(&self) -> &'a ActionName {
        match self {
            ActionRef::Table(t) => &t.name,
            ActionRef::Operation(o) => &o.name,
            ActionRef::Assertion(a) => &a.name,
            ActionRef::Test(t) => &t.name,
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            ActionRef::Table(_) => ActionType::Table,
            ActionRef::Operation(_) => ActionType::Operation,
            ActionRef::Assertion(_) => ActionType::Assertion,
            ActionRef::Test(_) => ActionType::Test,
        }
    }

    /// Output target; `None` for operations without output and for tests
    pub fn target(&self) -> Option<&'a Target> {
        match self {
            ActionRef::Table(t) => Some(&t.target),
            ActionRef::Operation(o) => o.target.as_ref(),
            ActionRef::Assertion(a) => Some(&a.target),
            ActionRef::Test(_) => None,
        }
    }

    /// Declared (or expanded) dependency names; tests have none
    pub fn dependencies(&self) -> &'a [String] {
        match self {
            ActionRef::Table(t) => &t.dependencies,
            ActionRef::Operation(o) => &o.dependencies,
            ActionRef::Assertion(a) => &a.dependencies,
            ActionRef::Test(_) => &[],
        }
    }

    pub fn tags(&self) -> &'a [String] {
        match self {
            ActionRef::Table(t) => &t.tags,
            ActionRef::Operation(o) => &o.tags,
            ActionRef::Assertion(a) => &a.tags,
            ActionRef::Test(_) => &[],
        }
    }

    pub fn file_name(&self) -> &'a str {
        match self {
            ActionRef::Table(t) => &t.file_name,
            ActionRef::Operation(o) => &o.file_name,
            ActionRef::Assertion(a) => &a.file_name,
            ActionRef::Test(t) => &t.file_name,
        }
    }

    /// Only datasets can be disabled
    pub fn is_disabled(&self) -> bool {
        match self {
            ActionRef::Table(t) => t.disabled,
            ActionRef::Operation(_) | ActionRef::Assertion(_) | ActionRef::Test(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
