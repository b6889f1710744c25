//! Error types for sf-sql

use thiserror::Error;

/// SQL rendering and parsing errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL parse error (S001)
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Dialect unknown, or no SQL registered for it (S002)
    #[error("[S002] Unsupported dialect '{dialect}': {reason}")]
    UnsupportedDialect { dialect: String, reason: String },

    /// Column addition that the dialect cannot apply (S003)
    #[error("[S003] Cannot add column '{table}.{column}' on {dialect}: {reason}")]
    UnsupportedAddColumn {
        dialect: String,
        table: String,
        column: String,
        reason: String,
    },

    /// Descriptor violates a schema invariant (S004)
    #[error("[S004] Invalid migration descriptor: {0}")]
    InvalidMigration(String),
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
