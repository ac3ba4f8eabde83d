//! Project and run configuration
//!
//! `ProjectConfig` is read from `weft.yml` and fixes naming for the whole
//! compile. `RunConfig` carries per-invocation choices (node selection,
//! full refresh) into the execution graph builder.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Warehouse backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseType {
    BigQuery,
    /// DuckDB (default)
    #[default]
    DuckDb,
    Postgres,
    Redshift,
    Snowflake,
}

impl std::fmt::Display for WarehouseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseType::BigQuery => write!(f, "bigquery"),
            WarehouseType::DuckDb => write!(f, "duckdb"),
            WarehouseType::Postgres => write!(f, "postgres"),
            WarehouseType::Redshift => write!(f, "redshift"),
            WarehouseType::Snowflake => write!(f, "snowflake"),
        }
    }
}

/// Project-wide configuration from weft.yml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Target warehouse backend
    #[serde(default)]
    pub warehouse: WarehouseType,

    /// Schema for actions that do not configure one
    #[serde(default = "default_schema")]
    pub default_schema: String,

    /// Schema holding assertion views
    #[serde(default = "default_assertion_schema")]
    pub assertion_schema: String,

    /// Appended as `_<suffix>` to every schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_suffix: Option<String>,

    /// Database (project / catalog) for actions that do not configure one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_database: Option<String>,
}

fn default_schema() -> String {
    "weft".to_string()
}

fn default_assertion_schema() -> String {
    "weft_assertions".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseType::default(),
            default_schema: default_schema(),
            assertion_schema: default_assertion_schema(),
            schema_suffix: None,
            default_database: None,
        }
    }
}

impl ProjectConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ProjectConfig =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for weft.yml or weft.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("weft.yml");
        let yaml_path = dir.join("weft.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.default_schema.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "default_schema cannot be empty".to_string(),
            });
        }
        if self.assertion_schema.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "assertion_schema cannot be empty".to_string(),
            });
        }
        if let Some(suffix) = &self.schema_suffix {
            if suffix.is_empty()
                || !suffix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "schema_suffix '{}' must be non-empty and contain only letters, digits and underscores",
                        suffix
                    ),
                });
            }
        }
        Ok(())
    }

    /// Apply command-line style schema overrides
    pub fn with_overrides(
        mut self,
        default_schema: Option<&str>,
        assertion_schema: Option<&str>,
    ) -> Self {
        if let Some(schema) = default_schema {
            self.default_schema = schema.to_string();
        }
        if let Some(schema) = assertion_schema {
            self.assertion_schema = schema.to_string();
        }
        self
    }

    /// Append the configured schema suffix, if any
    pub fn suffixed_schema(&self, schema: &str) -> String {
        match &self.schema_suffix {
            Some(suffix) => format!("{}_{}", schema, suffix),
            None => schema.to_string(),
        }
    }
}

/// Per-invocation run options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Rebuild incremental tables from scratch
    #[serde(default)]
    pub full_refresh: bool,

    /// Action names or `*` patterns to run; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,

    /// Also run transitive dependencies of the selected nodes
    #[serde(default)]
    pub include_dependencies: bool,
}

impl RunConfig {
    /// Validate flag combinations
    pub fn validate(&self) -> CoreResult<()> {
        if self.include_dependencies && self.nodes.is_empty() {
            return Err(CoreError::RunConfigInvalid {
                message: "include_dependencies should only be supplied along with nodes"
                    .to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
