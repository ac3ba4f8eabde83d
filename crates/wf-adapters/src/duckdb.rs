//! DuckDB adapter

use crate::base::{self, PublishDialect};
use crate::Adapter;
use wf_core::sql_utils::quote_ident;
use wf_core::{Assertion, RunConfig, Table, TableMetadata, Target, Task, Tasks, WarehouseType};

#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbAdapter;

impl DuckDbAdapter {
    pub fn new() -> Self {
        Self
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

impl Adapter for DuckDbAdapter {
    fn warehouse(&self) -> WarehouseType {
        WarehouseType::DuckDb
    }

    fn resolve_target(&self, target: &Target) -> String {
        let relation = format!("{}.{}", quote_ident(&target.schema), quote_ident(&target.name));
        match &target.database {
            Some(database) => format!("{}.{}", quote_ident(database), relation),
            None => relation,
        }
    }

    fn publish_tasks(
        &self,
        table: &Table,
        run_config: &RunConfig,
        metadata: Option<&TableMetadata>,
    ) -> Tasks {
        let resolved = self.resolve_target(&table.target);
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
                "select count(*) as row_count from {}",
                resolved
            )));
        tasks
    }

    fn create_schema_task(&self, schema: &str, database: Option<&str>) -> Task {
        let schema = match database {
            Some(database) => format!("{}.{}", quote_ident(database), quote_ident(schema)),
            None => quote_ident(schema),
        };
        Task::statement(base::create_schema_if_not_exists(&schema))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
