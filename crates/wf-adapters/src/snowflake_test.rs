use super::*;
use crate::test_support::{assertion, statements, table};
use wf_core::{RelationType, TableType};

#[test]
fn test_identifiers_are_upper_cased() {
    let adapter = SnowflakeAdapter::new();
    assert_eq!(adapter.normalize_identifier("orders"), "ORDERS");
    assert_eq!(
        adapter.resolve_target(&Target::new("analytics", "orders")),
        r#""ANALYTICS"."ORDERS""#
    );
    assert_eq!(
        adapter.resolve_target(&Target::new("analytics", "orders").with_database(Some("prod".into()))),
        r#""PROD"."ANALYTICS"."ORDERS""#
    );
}

#[test]
fn test_native_replace() {
    let tasks = SnowflakeAdapter::new().publish_tasks(
        &table("orders", TableType::Table),
        &RunConfig::default(),
        None,
    );
    assert_eq!(
        statements(tasks),
        vec![r#"create or replace table "ANALYTICS"."ORDERS" as select 1 as id"#]
    );
}

#[test]
fn test_existing_table_replaced_by_view() {
    let t = table("orders", TableType::View);
    let existing = TableMetadata::new(t.target.clone(), RelationType::Table, vec![]);
    let tasks = statements(SnowflakeAdapter::new().publish_tasks(
        &t,
        &RunConfig::default(),
        Some(&existing),
    ));
    assert_eq!(
        tasks,
        vec![
            r#"drop table if exists "ANALYTICS"."ORDERS" cascade"#,
            r#"create or replace view "ANALYTICS"."ORDERS" as select 1 as id"#,
        ]
    );
}

#[test]
fn test_incremental_insert_keeps_warehouse_column_case() {
    let t = table("orders", TableType::Incremental);
    let existing = TableMetadata::new(t.target.clone(), RelationType::Table, vec!["ID".into()]);
    let tasks = statements(SnowflakeAdapter::new().publish_tasks(
        &t,
        &RunConfig::default(),
        Some(&existing),
    ));
    assert_eq!(
        tasks,
        vec![r#"insert into "ANALYTICS"."ORDERS" ("ID") select "ID" from (select 1 as id) as insertions"#]
    );
}

#[test]
fn test_assertion_uses_sum() {
    let tasks = SnowflakeAdapter::new().assert_tasks(&assertion("dupes"));
    assert_eq!(
        statements(tasks)[1],
        r#"select sum(1) as row_count from "WEFT_ASSERTIONS"."DUPES""#
    );
}
