//! Warehouse connectivity traits

use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use wf_core::{TableMetadata, Target};

/// Rows returned by one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, if any
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Looks up what currently exists at a target
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// `None` when nothing exists at `target`
    async fn describe(&self, target: &Target) -> DbResult<Option<TableMetadata>>;
}

/// Database abstraction trait for Weft
///
/// Implementations must be Send + Sync so one connection can be shared by
/// every concurrently running node.
#[async_trait]
pub trait Database: MetadataLookup {
    /// Execute one SQL statement
    async fn execute(&self, sql: &str) -> DbResult<QueryResult>;

    /// Execute one SQL statement, aborting it when `cancel` fires
    ///
    /// Drivers without a cancellation primitive let the statement finish;
    /// callers stop issuing further statements once the token is cancelled.
    async fn execute_cancellable(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> DbResult<QueryResult> {
        let _ = cancel;
        self.execute(sql).await
    }

    /// Every user relation visible to the connection
    async fn list_tables(&self) -> DbResult<Vec<Target>> {
        Err(DbError::NotImplemented {
            backend: self.db_type().to_string(),
            feature: "list_tables".to_string(),
        })
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
