//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, MetadataLookup, QueryResult};
use async_trait::async_trait;
use duckdb::{Connection, InterruptHandle};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use wf_core::sql_utils::escape_sql_string;
use wf_core::{RelationType, TableMetadata, Target};

/// DuckDB database backend
///
/// Statements run on the blocking thread pool; one connection is shared
/// behind a mutex, so statements are serialized.
#[derive(Clone)]
pub struct DuckDbBackend {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> Self {
        let interrupt = conn.interrupt_handle();
        Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
        }
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| DbError::Internal(format!("blocking task failed: {}", e)))?
    }
}

/// Whether `sql` produces a result set
fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start().to_ascii_lowercase();
    ["select", "with", "values", "describe", "show", "pragma", "from"]
        .iter()
        .any(|kw| head.starts_with(kw))
}

/// Read a column value as JSON, trying the DuckDB types in turn
fn column_value(row: &duckdb::Row<'_>, idx: usize) -> Value {
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Value::from(n);
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Value::from(f);
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Value::from(b);
    }
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Value::from(s);
    }
    Value::Null
}

/// Driver error for `sql`; interrupts stay distinguishable as cancellations
fn statement_error(err: duckdb::Error, sql: &str) -> DbError {
    match DbError::from(err) {
        DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{}: {}", msg, sql)),
        other => other,
    }
}

fn query_sync(conn: &Connection, sql: &str) -> DbResult<QueryResult> {
    if !returns_rows(sql) {
        conn.execute_batch(sql)
            .map_err(|e| statement_error(e, sql))?;
        return Ok(QueryResult::default());
    }

    let mut stmt = conn.prepare(sql).map_err(|e| statement_error(e, sql))?;

    // Column metadata is only available once the statement has executed.
    let rows: Vec<Vec<Value>> = stmt
        .query_map([], |row| {
            let col_count = row.as_ref().column_count();
            Ok((0..col_count).map(|i| column_value(row, i)).collect())
        })
        .map_err(|e| statement_error(e, sql))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| statement_error(e, sql))?;

    let columns = (0..stmt.column_count())
        .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
        .collect();

    Ok(QueryResult { columns, rows })
}

fn describe_sync(conn: &Connection, target: &Target) -> DbResult<Option<TableMetadata>> {
    let catalog_filter = match &target.database {
        Some(db) => format!(" AND table_catalog = '{}'", escape_sql_string(db)),
        None => String::new(),
    };
    let filter = format!(
        "table_schema = '{}' AND table_name = '{}'{}",
        escape_sql_string(&target.schema),
        escape_sql_string(&target.name),
        catalog_filter
    );

    let tables = query_sync(
        conn,
        &format!(
            "SELECT table_type FROM information_schema.tables WHERE {}",
            filter
        ),
    )?;
    let relation_type = match tables.scalar().and_then(Value::as_str) {
        None => return Ok(None),
        Some("VIEW") => RelationType::View,
        Some(_) => RelationType::Table,
    };

    let columns = query_sync(
        conn,
        &format!(
            "SELECT column_name FROM information_schema.columns WHERE {} ORDER BY ordinal_position",
            filter
        ),
    )?
    .rows
    .into_iter()
    .filter_map(|row| row.into_iter().next())
    .filter_map(|v| v.as_str().map(str::to_string))
    .collect();

    Ok(Some(TableMetadata::new(target.clone(), relation_type, columns)))
}

#[async_trait]
impl MetadataLookup for DuckDbBackend {
    async fn describe(&self, target: &Target) -> DbResult<Option<TableMetadata>> {
        let target = target.clone();
        self.with_conn(move |conn| describe_sync(conn, &target)).await
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<QueryResult> {
        log::debug!("duckdb: {}", sql);
        let sql = sql.to_string();
        self.with_conn(move |conn| query_sync(conn, &sql)).await
    }

    async fn execute_cancellable(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> DbResult<QueryResult> {
        log::debug!("duckdb: {}", sql);
        let sql = sql.to_string();
        let token = cancel.clone();
        let statement = self.with_conn(move |conn| {
            // Queued behind another statement while the run was cancelled.
            if token.is_cancelled() {
                return Err(DbError::Cancelled(format!("not started: {}", sql)));
            }
            query_sync(conn, &sql)
        });
        tokio::pin!(statement);

        tokio::select! {
            result = &mut statement => result,
            _ = cancel.cancelled() => {
                log::debug!("duckdb: interrupting running statement");
                self.interrupt.interrupt();
                statement.await
            }
        }
    }

    async fn list_tables(&self) -> DbResult<Vec<Target>> {
        let result = self
            .with_conn(|conn| {
                query_sync(
                    conn,
                    "SELECT table_schema, table_name FROM information_schema.tables \
                     WHERE table_schema NOT IN ('information_schema', 'pg_catalog') \
                     ORDER BY table_schema, table_name",
                )
            })
            .await?;
        Ok(result
            .rows
            .into_iter()
            .filter_map(|row| match row.as_slice() {
                [Value::String(schema), Value::String(name)] => {
                    Some(Target::new(schema.as_str(), name.as_str()))
                }
                _ => None,
            })
            .collect())
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
