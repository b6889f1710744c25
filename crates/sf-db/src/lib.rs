//! sf-db - Database abstraction layer for Schemaflow
//!
//! This crate provides the `Database` trait and implementations
//! for SQLite and DuckDB. MySQL is render-only and has no live backend.

pub mod connect;
pub mod duckdb;
pub mod error;
pub mod sqlite;
pub mod traits;

pub use connect::connect;
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use sqlite::SqliteBackend;
pub use traits::{Database, SqlValue};
