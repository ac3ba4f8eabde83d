//! Redshift adapter
//!
//! Redshift has no `create or replace table`, so tables are built into a
//! `<name>_temp` sibling and swapped into place.

use crate::base::{self, PublishDialect};
use crate::Adapter;
use wf_core::sql_utils::quote_ident;
use wf_core::{
    Assertion, RedshiftOptions, RelationType, RunConfig, Table, TableMetadata,
    Target, Task, Tasks, WarehouseType,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RedshiftAdapter;

impl RedshiftAdapter {
    pub fn new() -> Self {
        Self
    }

    fn create_table(&self, table: &Table, target: &Target) -> String {
        let mut sql = format!("create table {}", self.resolve_target(target));
        if let Some(options) = &table.redshift {
            sql.push_str(&layout_clause(options));
        }
        format!("{} as {}", sql, table.query)
    }

    fn create_or_replace(&self, table: &Table) -> Vec<Task> {
        let resolved = self.resolve_target(&table.target);
        match table.table_type.base_relation() {
            RelationType::View => vec![Task::statement(format!(
                "create or replace view {} as {}",
                resolved, table.query
            ))],
            RelationType::Table => {
                let temp = base::temp_target(&table.target);
                base::swap_tasks(
                    &self.resolve_target(&temp),
                    &resolved,
                    &quote_ident(&table.target.name),
                    self.create_table(table, &temp),
                )
            }
        }
    }
}

/// ` diststyle X distkey (k) <style> sortkey (a, b)`; each half only when
/// both its style and its key are set
fn layout_clause(options: &RedshiftOptions) -> String {
    let mut clause = String::new();
    if let (Some(style), Some(key)) = (&options.dist_style, &options.dist_key) {
        clause.push_str(&format!(" diststyle {} distkey ({})", style, key));
    }
    if let Some(style) = &options.sort_style {
        if !options.sort_keys.is_empty() {
            clause.push_str(&format!(
                " {} sortkey ({})",
                style,
                options.sort_keys.join(", ")
            ));
        }
    }
    clause
}

impl Adapter for RedshiftAdapter {
    fn warehouse(&self) -> WarehouseType {
        WarehouseType::Redshift
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

#[cfg(test)]
#[path = "redshift_test.rs"]
mod tests;
