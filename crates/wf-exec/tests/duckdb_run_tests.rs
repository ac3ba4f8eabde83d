//! End-to-end runs against an in-memory DuckDB

use serde_json::Value;
use std::sync::Arc;
use wf_compiler::{compile, ActionDeclaration, DeclarationKind};
use wf_core::{CompiledGraph, ProjectConfig, RunConfig};
use wf_db::{Database, DuckDbBackend};
use wf_exec::{build, run, ExecutedGraph, NodeStatus};

fn declare(kind: DeclarationKind, name: &str, sql: &str, deps: &[&str]) -> ActionDeclaration {
    ActionDeclaration::new(kind, name, sql).with_dependencies(deps.iter().copied())
}

fn project() -> CompiledGraph {
    let mut events = declare(
        DeclarationKind::Incremental,
        "events",
        "select id, amount from main.source_orders",
        &[],
    );
    events.where_clause =
        Some("id > (select coalesce(max(id), 0) from weft.events)".to_string());

    let graph = compile(
        vec![
            declare(
                DeclarationKind::View,
                "raw_orders",
                "select * from main.source_orders",
                &[],
            ),
            declare(
                DeclarationKind::Table,
                "orders",
                "select id, amount from weft.raw_orders",
                &["raw_*"],
            ),
            declare(
                DeclarationKind::Assertion,
                "orders_positive",
                "select * from weft.orders where amount <= 0",
                &["orders"],
            ),
            declare(
                DeclarationKind::Operations,
                "order_totals",
                "create or replace table weft.order_totals as select count(*) as n from weft.orders",
                &["orders_positive"],
            ),
            events,
        ],
        ProjectConfig::default(),
    );
    assert!(!graph.has_errors(), "{:?}", graph.graph_errors);
    graph
}

async fn seeded() -> Arc<DuckDbBackend> {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute(
        "create table main.source_orders as \
         select * from (values (1, 10.0), (2, 20.0)) as t(id, amount)",
    )
    .await
    .unwrap();
    Arc::new(db)
}

async fn run_project(db: &Arc<DuckDbBackend>, graph: &CompiledGraph) -> ExecutedGraph {
    let execution = build(graph, &RunConfig::default(), db.as_ref())
        .await
        .unwrap();
    run(execution, Arc::clone(db) as Arc<dyn Database>)
        .result()
        .await
        .unwrap()
}

async fn count(db: &DuckDbBackend, relation: &str) -> Value {
    db.execute(&format!("select count(*) from {}", relation))
        .await
        .unwrap()
        .scalar()
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_project_runs_end_to_end() {
    let db = seeded().await;
    let executed = run_project(&db, &project()).await;

    assert!(executed.ok, "{}", executed.to_json_pretty().unwrap());
    assert_eq!(executed.setup_tasks.len(), 2);
    assert_eq!(executed.summary().succeeded, 5);

    assert_eq!(count(&db, "weft.orders").await, Value::from(2));
    assert_eq!(count(&db, "weft.events").await, Value::from(2));
    assert_eq!(count(&db, "weft.order_totals").await, Value::from(1));
    assert_eq!(count(&db, "weft_assertions.orders_positive").await, Value::from(0));
}

#[tokio::test]
async fn test_incremental_table_appends_on_second_run() {
    let db = seeded().await;
    let graph = project();
    assert!(run_project(&db, &graph).await.ok);

    db.execute("insert into main.source_orders values (3, 30.0)")
        .await
        .unwrap();
    let executed = run_project(&db, &graph).await;
    assert!(executed.ok);

    let events = executed.node("events").unwrap();
    assert_eq!(events.tasks.len(), 1);
    assert!(events.tasks[0].task.statement.starts_with("insert into"));
    assert_eq!(count(&db, "weft.events").await, Value::from(3));
}

#[tokio::test]
async fn test_failing_assertion_skips_dependent_operation() {
    let db = seeded().await;
    db.execute("insert into main.source_orders values (4, -5.0)")
        .await
        .unwrap();
    let executed = run_project(&db, &project()).await;

    assert!(!executed.ok);
    assert_eq!(executed.status("orders"), Some(NodeStatus::Succeeded));
    assert_eq!(executed.status("orders_positive"), Some(NodeStatus::Failed));
    assert_eq!(executed.status("order_totals"), Some(NodeStatus::Skipped));
    assert_eq!(executed.status("events"), Some(NodeStatus::Succeeded));

    let tables = db.list_tables().await.unwrap();
    assert!(!tables.iter().any(|t| t.name == "order_totals"));
}

#[tokio::test]
async fn test_view_replaced_by_table_is_dropped_first() {
    let db = seeded().await;
    db.execute("create schema weft").await.unwrap();
    db.execute("create view weft.orders as select 1 as id, 1.0 as amount")
        .await
        .unwrap();

    let executed = run_project(&db, &project()).await;
    assert!(executed.ok, "{}", executed.to_json_pretty().unwrap());

    let orders = executed.node("orders").unwrap();
    assert!(orders.tasks[0]
        .task
        .statement
        .starts_with("drop view if exists \"weft\".\"orders\" cascade"));
    assert_eq!(count(&db, "weft.orders").await, Value::from(2));
}
