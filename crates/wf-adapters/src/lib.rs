//! wf-adapters - Warehouse adapters for Weft
//!
//! An adapter turns compiled actions into the ordered SQL tasks one warehouse
//! dialect needs. Every backend implements the [`Adapter`] trait; the
//! decisions they share (kind changes, incremental appends, pre/post
//! operations) live in [`base`].

pub mod base;
pub mod bigquery;
pub mod duckdb;
pub mod postgres;
pub mod redshift;
pub mod snowflake;

pub use bigquery::BigQueryAdapter;
pub use duckdb::DuckDbAdapter;
pub use postgres::PostgresAdapter;
pub use redshift::RedshiftAdapter;
pub use snowflake::SnowflakeAdapter;

use wf_core::{
    Assertion, ProjectConfig, RunConfig, Table, TableMetadata, Target, Task, Tasks, WarehouseType,
};

/// SQL generation for one warehouse dialect
///
/// Implementations must be Send + Sync so one adapter can be shared across
/// the execution graph builder and worker tasks.
pub trait Adapter: Send + Sync {
    /// Backend this adapter generates SQL for
    fn warehouse(&self) -> WarehouseType;

    /// Fully-qualified, quoted reference to `target`
    fn resolve_target(&self, target: &Target) -> String;

    /// Canonical case for an unquoted identifier
    fn normalize_identifier(&self, identifier: &str) -> String {
        identifier.to_string()
    }

    /// Tasks that (re)build `table`, given what currently exists at its target
    fn publish_tasks(
        &self,
        table: &Table,
        run_config: &RunConfig,
        metadata: Option<&TableMetadata>,
    ) -> Tasks;

    /// Tasks that materialize `assertion` as a view and count its rows
    fn assert_tasks(&self, assertion: &Assertion) -> Tasks;

    /// Statement creating `schema` when it does not exist
    fn create_schema_task(&self, schema: &str, database: Option<&str>) -> Task;
}

/// Select the adapter for the configured warehouse
pub fn create(project: &ProjectConfig) -> Box<dyn Adapter> {
    log::debug!("Using {} adapter", project.warehouse);
    match project.warehouse {
        WarehouseType::BigQuery => Box::new(BigQueryAdapter::new()),
        WarehouseType::DuckDb => Box::new(DuckDbAdapter::new()),
        WarehouseType::Postgres => Box::new(PostgresAdapter::new()),
        WarehouseType::Redshift => Box::new(RedshiftAdapter::new()),
        WarehouseType::Snowflake => Box::new(SnowflakeAdapter::new()),
    }
}
