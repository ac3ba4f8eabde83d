//! Postgres adapter
//!
//! Tables use the same temp-table swap as Redshift, without layout options.

use crate::base::{self, PublishDialect};
use crate::Adapter;
use wf_core::sql_utils::quote_ident;
use wf_core::{
    Assertion, RelationType, RunConfig, Table, TableMetadata, Target, Task, Tasks,
    WarehouseType,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

impl PostgresAdapter {
    pub fn new() -> Self {
        Self
    }

    fn create_or_replace(&self, table: &Table) -> Vec<Task> {
        let resolved = self.resolve_target(&table.target);
        match table.table_type.base_relation() {
            RelationType::View => vec![Task::statement(format!(
                "create or replace view {} as {}",
                resolved, table.query
            ))],
            RelationType::Table => {
                let temp = self.resolve_target(&base::temp_target(&table.target));
                let create = format!("create table {} as {}", temp, table.query);
                base::swap_tasks(&temp, &resolved, &quote_ident(&table.target.name), create)
            }
        }
    }
}

impl Adapter for PostgresAdapter {
    fn warehouse(&self) -> WarehouseType {
        WarehouseType::Postgres
    }

    fn resolve_target(&self, target: &Target) -> String {
        format!("{}.{}", quote_ident(&target.schema), quote_ident(&target.name))
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

    fn create_schema_task(&self, schema: &str, _database: Option<&str>) -> Task {
        Task::statement(base::create_schema_if_not_exists(&quote_ident(schema)))
    }
}
