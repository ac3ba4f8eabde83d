//! wf-db - Warehouse connectivity for Weft
//!
//! This crate provides the `Database` and `MetadataLookup` traits, a DuckDB
//! implementation, and a map-backed metadata lookup for offline builds.

pub mod duckdb;
pub mod error;
pub mod memory;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use memory::StaticMetadata;
pub use traits::{Database, MetadataLookup, QueryResult};
