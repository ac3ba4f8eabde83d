use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_execute_returns_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    let result = db
        .execute("SELECT 1 AS id, 'hello' AS name, NULL AS missing")
        .await
        .unwrap();
    assert_eq!(result.columns, vec!["id", "name", "missing"]);
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.rows[0][0], Value::from(1));
    assert_eq!(result.rows[0][1], Value::from("hello"));
    assert_eq!(result.rows[0][2], Value::Null);
}

#[tokio::test]
async fn test_execute_statement_without_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    let result = db
        .execute("CREATE TABLE nums AS SELECT * FROM range(10) t(n)")
        .await
        .unwrap();
    assert!(result.is_empty());

    let count = db.execute("select count(*) as row_count from nums").await.unwrap();
    assert_eq!(count.scalar(), Some(&Value::from(10)));
}

#[tokio::test]
async fn test_execution_error() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("SELECT * FROM does_not_exist").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
    assert!(err.to_string().contains("[D002]"));
}

#[tokio::test]
async fn test_describe_table_and_view() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE SCHEMA analytics").await.unwrap();
    db.execute("CREATE TABLE analytics.orders (id INTEGER, amount DOUBLE, ts TIMESTAMP)")
        .await
        .unwrap();
    db.execute("CREATE VIEW analytics.recent AS SELECT id FROM analytics.orders")
        .await
        .unwrap();

    let orders = db
        .describe(&Target::new("analytics", "orders"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(orders.relation_type, RelationType::Table);
    assert_eq!(orders.columns, vec!["id", "amount", "ts"]);

    let recent = db
        .describe(&Target::new("analytics", "recent"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recent.relation_type, RelationType::View);
}

#[tokio::test]
async fn test_describe_missing() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(db
        .describe(&Target::new("main", "nope"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_tables() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE b (id INT); CREATE TABLE a (id INT);")
        .await
        .unwrap();
    let tables = db.list_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![Target::new("main", "a"), Target::new("main", "b")]
    );
}

#[tokio::test]
async fn test_file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warehouse.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute("CREATE TABLE kept AS SELECT 1 AS id").await.unwrap();
    }
    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    let result = db.execute("SELECT id FROM kept").await.unwrap();
    assert_eq!(result.scalar(), Some(&Value::from(1)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_interrupts_running_statement() {
    use std::time::{Duration, Instant};

    let db = DuckDbBackend::in_memory().unwrap();
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        db.execute_cancellable(
            "select count(*) from range(200000000) a, range(200000000) b",
            &token,
        ),
    )
    .await
    .expect("statement was not interrupted");

    assert!(matches!(result, Err(DbError::Cancelled(_))), "{:?}", result);
    assert!(start.elapsed() < Duration::from_secs(5));

    // The connection stays usable after an interrupt.
    let after = db.execute("select 1").await.unwrap();
    assert_eq!(after.scalar(), Some(&Value::from(1)));
}

#[tokio::test]
async fn test_cancelled_token_skips_statement() {
    let db = DuckDbBackend::in_memory().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = db
        .execute_cancellable("CREATE TABLE never AS SELECT 1 AS id", &token)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Cancelled(_)));
    assert!(db
        .describe(&Target::new("main", "never"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_execute_cancellable_without_cancel() {
    let db = DuckDbBackend::in_memory().unwrap();
    let token = CancellationToken::new();
    let result = db.execute_cancellable("select 42", &token).await.unwrap();
    assert_eq!(result.scalar(), Some(&Value::from(42)));
}
