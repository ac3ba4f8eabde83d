//! Snowflake adapter
//!
//! Snowflake folds unquoted identifiers to upper case, so every identifier
//! is normalized before being quoted.

use crate::base::{self, PublishDialect};
use crate::Adapter;
use wf_core::sql_utils::quote_ident;
use wf_core::{Assertion, RunConfig, Table, TableMetadata, Target, Task, Tasks, WarehouseType};

#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeAdapter;

impl SnowflakeAdapter {
    pub fn new() -> Self {
        Self
    }

    fn quote(&self, identifier: &str) -> String {
        quote_ident(&self.normalize_identifier(identifier))
    }

    fn create_or_replace(&self, table: &Table) -> Vec<Task> {
        vec![Task::statement(format!(
            "create or replace {} {} as {}",
            table.table_type.base_relation().keyword(),
            self.resolve_target(&table.target),
            table.query
        ))]
    }
}

impl Adapter for SnowflakeAdapter {
    fn warehouse(&self) -> WarehouseType {
        WarehouseType::Snowflake
    }

    fn resolve_target(&self, target: &Target) -> String {
        let relation = format!("{}.{}", self.quote(&target.schema), self.quote(&target.name));
        match &target.database {
            Some(database) => format!("{}.{}", self.quote(database), relation),
            None => relation,
        }
    }

    fn normalize_identifier(&self, identifier: &str) -> String {
        identifier.to_uppercase()
    }

    fn publish_tasks(
        &self,
        table: &Table,
        run_config: &RunConfig,
        metadata: Option<&TableMetadata>,
    ) -> Tasks {
        let resolved = self.resolve_target(&table.target);
        // Column names come back from the warehouse already folded.
        let dialect = PublishDialect {
            resolved: &resolved,
            cascade: true,
            quote_column: quote_ident,
        };
        base::publish(table, run_config, metadata, dialect, || {
            self.create_or_replace(table)
        })
    }

    fn assert_tasks(&self, assertion: &Assertion) -> Tasks {
        let resolved = self.resolve_target(&assertion.target);
        let mut tasks = Tasks::new();
        tasks
            .add(Task::statement(format!(
                "create or replace view {} as {}",
                resolved, assertion.query
            )))
            .add(Task::assertion(format!(
                "select sum(1) as row_count from {}",
                resolved
            )));
        tasks
    }

    fn create_schema_task(&self, schema: &str, database: Option<&str>) -> Task {
        let schema = match database {
            Some(database) => format!("{}.{}", self.quote(database), self.quote(schema)),
            None => self.quote(schema),
        };
        Task::statement(base::create_schema_if_not_exists(&schema))
    }
}

#[cfg(test)]
#[path = "snowflake_test.rs"]
mod tests;
