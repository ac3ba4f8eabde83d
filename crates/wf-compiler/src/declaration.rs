//! Raw action declarations
//!
//! The templating layer hands the compiler a flat list of declarations, one
//! per source file. Nothing here is validated; [`crate::Session::declare`]
//! applies the rule set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use wf_core::{BigQueryOptions, CoreError, CoreResult, RedshiftOptions, TableType};

/// Declared kind of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    View,
    #[default]
    Table,
    Inline,
    Incremental,
    Assertion,
    Operations,
    Test,
}

impl DeclarationKind {
    /// The dataset flavour, for kinds that create a dataset
    pub fn table_type(self) -> Option<TableType> {
        match self {
            DeclarationKind::View => Some(TableType::View),
            DeclarationKind::Table => Some(TableType::Table),
            DeclarationKind::Inline => Some(TableType::Inline),
            DeclarationKind::Incremental => Some(TableType::Incremental),
            DeclarationKind::Assertion | DeclarationKind::Operations | DeclarationKind::Test => {
                None
            }
        }
    }

    pub fn is_dataset(self) -> bool {
        self.table_type().is_some()
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationKind::View => write!(f, "view"),
            DeclarationKind::Table => write!(f, "table"),
            DeclarationKind::Inline => write!(f, "inline"),
            DeclarationKind::Incremental => write!(f, "incremental"),
            DeclarationKind::Assertion => write!(f, "assertion"),
            DeclarationKind::Operations => write!(f, "operations"),
            DeclarationKind::Test => write!(f, "test"),
        }
    }
}

/// One raw action declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDeclaration {
    #[serde(rename = "type", default)]
    pub kind: DeclarationKind,

    /// Action name, optionally `schema.name`
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Dependency names or `*` patterns
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub has_output: bool,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub protected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redshift: Option<RedshiftOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bigquery: Option<BigQueryOptions>,

    /// Dataset under test (tests only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Source file the declaration came from
    #[serde(default)]
    pub file_name: String,

    /// Rendered SQL statements of the main body
    #[serde(default)]
    pub statements: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_query: Option<String>,

    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incremental_where: Option<String>,

    #[serde(default)]
    pub pre_operations: Vec<String>,

    #[serde(default)]
    pub post_operations: Vec<String>,

    /// Fixture queries keyed by the dataset they replace (tests only)
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

impl ActionDeclaration {
    /// A declaration of `kind` with a single statement
    pub fn new(kind: DeclarationKind, name: impl Into<String>, sql: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind,
            file_name: format!("{}.sql", name),
            name,
            statements: vec![sql.into()],
            ..Self::default()
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any incremental-only setting is present
    pub(crate) fn has_incremental_config(&self) -> bool {
        self.incremental_query.is_some() || self.incremental_where.is_some()
    }
}

/// The flat declaration list handed over by the templating layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Declarations {
    pub actions: Vec<ActionDeclaration>,
}

impl Declarations {
    /// Load a YAML (or JSON) list of declarations
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let declarations: Declarations = serde_yaml::from_str(&content)?;
        log::debug!(
            "Loaded {} declarations from {}",
            declarations.actions.len(),
            path.display()
        );
        Ok(declarations)
    }
}

impl IntoIterator for Declarations {
    type Item = ActionDeclaration;
    type IntoIter = std::vec::IntoIter<ActionDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}
