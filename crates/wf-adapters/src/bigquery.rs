//! BigQuery adapter

use crate::base::{self, PublishDialect};
use crate::Adapter;
use wf_core::sql_utils::quote_backtick;
use wf_core::{
    Assertion, BigQueryOptions, RelationType, RunConfig, Table, TableMetadata,
    Target, Task, Tasks, WarehouseType,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct BigQueryAdapter;

impl BigQueryAdapter {
    pub fn new() -> Self {
        Self
    }

    fn create_or_replace(&self, table: &Table) -> Vec<Task> {
        let resolved = self.resolve_target(&table.target);
        let sql = match table.table_type.base_relation() {
            RelationType::View => format!("create or replace view {} as {}", resolved, table.query),
            RelationType::Table => format!(
                "create or replace table {}{} as {}",
                resolved,
                table
                    .bigquery
                    .as_ref()
                    .map(layout_clause)
                    .unwrap_or_default(),
                table.query
            ),
        };
        vec![Task::statement(sql)]
    }
}

fn layout_clause(options: &BigQueryOptions) -> String {
    let mut clause = String::new();
    if let Some(partition_by) = &options.partition_by {
        clause.push_str(&format!(" partition by {}", partition_by));
    }
    if !options.cluster_by.is_empty() {
        clause.push_str(&format!(" cluster by {}", options.cluster_by.join(", ")));
    }
    clause
}

impl Adapter for BigQueryAdapter {
    fn warehouse(&self) -> WarehouseType {
        WarehouseType::BigQuery
    }

    fn resolve_target(&self, target: &Target) -> String {
        match &target.database {
            Some(project) => quote_backtick(&format!(
                "{}.{}.{}",
                project, target.schema, target.name
            )),
            None => quote_backtick(&format!("{}.{}", target.schema, target.name)),
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
            cascade: false,
            quote_column: quote_backtick,
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
        let dataset = match database {
            Some(project) => quote_backtick(&format!("{}.{}", project, schema)),
            None => quote_backtick(schema),
        };
        Task::statement(base::create_schema_if_not_exists(&dataset))
    }
}
