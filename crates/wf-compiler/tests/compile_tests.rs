//! Integration tests for compiling declaration documents

use std::io::Write;
use wf_compiler::{compile, ActionDeclaration, DeclarationKind, Declarations};
use wf_core::{CompiledGraph, ProjectConfig, TableType, WarehouseType};

const PROJECT: &str = r#"
- name: raw_orders
  type: view
  file_name: definitions/raw_orders.sqlx
  statements: ["select * from source.orders"]
- name: raw_customers
  type: view
  file_name: definitions/raw_customers.sqlx
  statements: ["select * from source.customers"]
- name: orders
  type: incremental
  file_name: definitions/orders.sqlx
  dependencies: ["raw_*"]
  statements: ["select * from weft.raw_orders"]
  where: "ts > (select max(ts) from weft.orders)"
  redshift:
    dist_key: customer_id
    dist_style: key
- name: orders_unique
  type: assertion
  file_name: definitions/orders_unique.sqlx
  dependencies: ["orders"]
  statements: ["select id from weft.orders group by id having count(*) > 1"]
- name: grants
  type: operations
  file_name: definitions/grants.sqlx
  dependencies: ["orders", "orders_unique"]
  statements:
    - "grant select on weft.orders to reporting"
    - "grant usage on schema weft to reporting"
- name: orders_test
  type: test
  file_name: definitions/orders_test.sqlx
  dataset: orders
  statements: ["select 1 as id"]
  inputs:
    raw_orders: "select 1 as id, now() as ts"
"#;

fn load_project() -> Declarations {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROJECT.as_bytes()).unwrap();
    Declarations::load(file.path()).unwrap()
}

#[test]
fn test_compile_project() {
    let config = ProjectConfig {
        warehouse: WarehouseType::Redshift,
        ..ProjectConfig::default()
    };
    let graph = compile(load_project(), config);

    assert!(!graph.has_errors(), "{:?}", graph.graph_errors);
    assert_eq!(graph.tables.len(), 3);
    assert_eq!(graph.operations.len(), 1);
    assert_eq!(graph.assertions.len(), 1);
    assert_eq!(graph.tests.len(), 1);

    let orders = graph.tables.iter().find(|t| t.name == "orders").unwrap();
    assert_eq!(orders.table_type, TableType::Incremental);
    assert_eq!(orders.dependencies, vec!["raw_customers", "raw_orders"]);
    assert_eq!(orders.target.schema, "weft");
    assert!(orders.redshift.is_some());

    assert_eq!(graph.assertions[0].target.schema, "weft_assertions");
    assert_eq!(graph.operations[0].queries.len(), 2);
}

#[test]
fn test_tests_are_not_dependency_targets() {
    let declarations = vec![
        ActionDeclaration::new(DeclarationKind::Table, "orders", "select 1"),
        ActionDeclaration {
            dataset: Some("orders".into()),
            ..ActionDeclaration::new(DeclarationKind::Test, "orders_test", "select 1")
        },
        ActionDeclaration::new(DeclarationKind::View, "summary", "select 1")
            .with_dependencies(["orders*"]),
    ];
    let graph = compile(declarations, ProjectConfig::default());
    let summary = graph.tables.iter().find(|t| t.name == "summary").unwrap();
    assert_eq!(summary.dependencies, vec!["orders"]);
}

#[test]
fn test_errors_carry_file_names() {
    let declarations = vec![
        ActionDeclaration {
            disabled: true,
            ..ActionDeclaration::new(DeclarationKind::Assertion, "check", "select 1")
        },
        ActionDeclaration::new(DeclarationKind::Table, "check", "select 1"),
    ];
    let graph = compile(declarations, ProjectConfig::default());
    let files: Vec<&str> = graph
        .graph_errors
        .compilation_errors
        .iter()
        .map(|e| e.file_name.as_str())
        .collect();
    assert_eq!(files, vec!["check.sql", "check.sql"]);
    assert_eq!(graph.tables.len(), 1);
    assert_eq!(graph.assertions.len(), 1);
}

#[test]
fn test_compiled_graph_json_shape() {
    let graph = compile(load_project(), ProjectConfig::default());
    let json = graph.to_json_pretty().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["project_config"]["warehouse"], "duckdb");
    assert_eq!(value["tables"][0]["type"], "incremental");
    assert!(value["graph_errors"]["compilation_errors"]
        .as_array()
        .unwrap()
        .is_empty());

    let parsed = CompiledGraph::from_json(&json).unwrap();
    assert_eq!(parsed, graph);
}
