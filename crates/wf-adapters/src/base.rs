//! Shared helpers consumed by every adapter
//!
//! Backends differ in quoting and in how they replace a table; the decisions
//! about *when* to drop, append or rebuild are made here once.

use wf_core::{RelationType, RunConfig, Table, TableMetadata, TableType, Target, Task, Tasks};

/// `drop <kind> if exists <resolved> [cascade]`
pub fn drop_if_exists(resolved: &str, relation: RelationType, cascade: bool) -> String {
    if cascade {
        format!("drop {} if exists {} cascade", relation.keyword(), resolved)
    } else {
        format!("drop {} if exists {}", relation.keyword(), resolved)
    }
}

/// `create schema if not exists <resolved>`
pub fn create_schema_if_not_exists(resolved_schema: &str) -> String {
    format!("create schema if not exists {}", resolved_schema)
}

/// The existing relation kind when it conflicts with the kind `table` builds
///
/// A kind change requires dropping the existing object before recreating it.
pub fn conflicting_relation(
    table: &Table,
    metadata: Option<&TableMetadata>,
) -> Option<RelationType> {
    metadata
        .map(|m| m.relation_type)
        .filter(|existing| *existing != table.table_type.base_relation())
}

/// Whether an incremental table should append instead of being rebuilt
///
/// Appending requires an existing *table*; a full refresh forces a rebuild
/// unless the table is protected.
pub fn should_write_incrementally(
    table: &Table,
    run_config: &RunConfig,
    metadata: Option<&TableMetadata>,
) -> bool {
    match table.table_type {
        TableType::Incremental => {
            let exists_as_table =
                matches!(metadata, Some(m) if m.relation_type == RelationType::Table);
            exists_as_table && (!run_config.full_refresh || table.protected)
        }
        TableType::View | TableType::Table | TableType::Inline => false,
    }
}

/// Wrap `query` in a filtering subquery when any predicate is present
pub fn where_clause(query: &str, predicates: &[&str]) -> String {
    let predicates: Vec<String> = predicates
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| format!("({})", p))
        .collect();
    if predicates.is_empty() {
        query.to_string()
    } else {
        format!(
            "select * from ({}) as subquery where {}",
            query,
            predicates.join(" and ")
        )
    }
}

/// The SELECT feeding an incremental append
pub fn incremental_source(table: &Table) -> String {
    let query = table.incremental_query.as_deref().unwrap_or(&table.query);
    let predicates: Vec<&str> = [&table.where_clause, &table.incremental_where]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .collect();
    where_clause(query, &predicates)
}

/// Insert the rows of `query` into an existing object, restricted to its
/// current (already quoted) columns
pub fn insert_into(resolved: &str, quoted_columns: &[String], query: &str) -> String {
    if quoted_columns.is_empty() {
        return format!("insert into {} select * from ({}) as insertions", resolved, query);
    }
    let columns = quoted_columns.join(", ");
    format!(
        "insert into {} ({}) select {} from ({}) as insertions",
        resolved, columns, columns, query
    )
}

/// Name of the temporary object used by the swap pattern
pub fn temp_target(target: &Target) -> Target {
    target.sibling(format!("{}_temp", target.name))
}

/// Dialect pieces [`publish`] needs from a backend
pub struct PublishDialect<'a> {
    /// Resolved reference to the table target
    pub resolved: &'a str,
    /// Whether `drop ... if exists` takes `cascade`
    pub cascade: bool,
    /// Quote one column name for an incremental insert
    pub quote_column: fn(&str) -> String,
}

/// Order the tasks publishing `table`:
/// pre operations, a drop when the existing object has the other kind, then
/// either an incremental insert or `create_or_replace`, then post operations.
pub fn publish(
    table: &Table,
    run_config: &RunConfig,
    metadata: Option<&TableMetadata>,
    dialect: PublishDialect<'_>,
    create_or_replace: impl FnOnce() -> Vec<Task>,
) -> Tasks {
    let mut tasks = Tasks::new();
    tasks.add_all(pre_ops(table));

    if let Some(existing) = conflicting_relation(table, metadata) {
        log::debug!(
            "{} exists as a {}, dropping before building a {}",
            dialect.resolved,
            existing,
            table.table_type
        );
        tasks.add(Task::statement(drop_if_exists(
            dialect.resolved,
            existing,
            dialect.cascade,
        )));
    }

    match metadata {
        Some(existing) if should_write_incrementally(table, run_config, metadata) => {
            let columns: Vec<String> = existing
                .columns
                .iter()
                .map(|c| (dialect.quote_column)(c))
                .collect();
            tasks.add(Task::statement(insert_into(
                dialect.resolved,
                &columns,
                &incremental_source(table),
            )));
        }
        _ => {
            tasks.add_all(create_or_replace());
        }
    }

    tasks.add_all(post_ops(table));
    tasks
}

/// Build into a temporary table, then replace the target with it
///
/// `create_temp` must create the (already dropped) temporary table.
/// `quoted_name` is the bare, quoted target name used by `rename to`.
pub fn swap_tasks(
    resolved_temp: &str,
    resolved_target: &str,
    quoted_name: &str,
    create_temp: String,
) -> Vec<Task> {
    vec![
        Task::statement(drop_if_exists(resolved_temp, RelationType::Table, true)),
        Task::statement(create_temp),
        Task::statement(drop_if_exists(resolved_target, RelationType::Table, true)),
        Task::statement(format!(
            "alter table {} rename to {}",
            resolved_temp, quoted_name
        )),
    ]
}

pub fn pre_ops(table: &Table) -> impl Iterator<Item = Task> + '_ {
    table.pre_ops.iter().map(Task::statement)
}

pub fn post_ops(table: &Table) -> impl Iterator<Item = Task> + '_ {
    table.post_ops.iter().map(Task::statement)
}

#[cfg(test)]
#[path = "base_test.rs"]
mod tests;
