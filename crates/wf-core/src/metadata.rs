//! Observed warehouse state

use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of object currently existing in the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Table,
    View,
}

impl RelationType {
    /// SQL keyword for DDL (`drop table`, `create view`, ...)
    pub fn keyword(self) -> &'static str {
        match self {
            RelationType::Table => "table",
            RelationType::View => "view",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Metadata describing an existing warehouse object
///
/// An absent object is represented by `Option::<TableMetadata>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub target: Target,

    #[serde(rename = "type")]
    pub relation_type: RelationType,

    /// Column names in ordinal order
    #[serde(default)]
    pub columns: Vec<String>,
}

impl TableMetadata {
    pub fn new(target: Target, relation_type: RelationType, columns: Vec<String>) -> Self {
        Self {
            target,
            relation_type,
            columns,
        }
    }
}
