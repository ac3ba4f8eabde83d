//! Fully-qualified warehouse object references

use serde::{Deserialize, Serialize};
use std::fmt;

/// One physical warehouse object: `[database.]schema.name`
///
/// Targets are assigned once by the compiler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    /// Schema (dataset) holding the object
    pub schema: String,

    /// Object name
    pub name: String,

    /// Optional database (project / catalog) qualifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Target {
    /// Create a target without a database qualifier
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            database: None,
        }
    }

    /// Return a copy of this target qualified with `database`
    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    /// A sibling target in the same schema/database with a different name
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
            database: self.database.clone(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}.{}", db, self.schema, self.name),
            None => write!(f, "{}.{}", self.schema, self.name),
        }
    }
}
