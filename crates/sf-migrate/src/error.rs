//! Error types for the migration engine.

use sf_core::CoreError;
use sf_db::DbError;
use sf_sql::SqlError;
use thiserror::Error;

/// Migration engine errors.
///
/// `DuplicateName`, `UnsupportedDialect`, `InvalidMigration` and `Render` are
/// raised while building the plan, before any database access. The rest are
/// raised while running it.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Two steps share a name (M001).
    #[error("[M001] Duplicate migration name: '{name}'")]
    DuplicateName { name: String },

    /// Dialect unknown, or a raw step has no SQL for it (M002).
    #[error("[M002] Unsupported dialect '{dialect}': {reason}")]
    UnsupportedDialect { dialect: String, reason: String },

    /// A step's SQL failed; the failure is in the log and the run halted (M003).
    #[error("[M003] Migration '{name}' failed: {message}")]
    Execution { name: String, message: String },

    /// Appending to the migration log failed; the run aborted (M004).
    #[error("[M004] Failed to write migration log entry for '{name}': {message}")]
    LogWrite { name: String, message: String },

    /// The migration log exists but could not be read back (M005).
    #[error("[M005] Failed to read migration log: {0}")]
    LogRead(String),

    /// The plan was rendered for a different backend than the one connected (M006).
    #[error("[M006] Plan rendered for '{dialect}' cannot run against a '{backend}' database")]
    BackendMismatch { dialect: String, backend: String },

    /// A descriptor violates a schema invariant (M007).
    #[error("[M007] Invalid migration '{name}': {reason}")]
    InvalidMigration { name: String, reason: String },

    /// A step could not be rendered for the active dialect (M008).
    #[error("[M008] Cannot render migration '{name}'")]
    Render {
        name: String,
        #[source]
        source: SqlError,
    },

    /// Configuration or catalog error (M009).
    #[error("[M009] {0}")]
    Core(CoreError),

    /// Database error outside of step execution (M010).
    #[error("[M010] {0}")]
    Db(#[from] DbError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<CoreError> for MigrateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateMigration { name } => MigrateError::DuplicateName { name },
            CoreError::UnsupportedDialect { name } => MigrateError::UnsupportedDialect {
                dialect: name,
                reason: "expected one of: sqlite, mysql, duckdb".to_string(),
            },
            CoreError::InvalidMigration { name, reason } => {
                MigrateError::InvalidMigration { name, reason }
            }
            other => MigrateError::Core(other),
        }
    }
}

impl MigrateError {
    /// Attach the failing step's name to a rendering error.
    pub(crate) fn from_render(name: &str, err: SqlError) -> Self {
        match err {
            SqlError::UnsupportedDialect { dialect, reason } => MigrateError::UnsupportedDialect {
                dialect,
                reason: format!("step '{name}': {reason}"),
            },
            SqlError::InvalidMigration(reason) => MigrateError::InvalidMigration {
                name: name.to_string(),
                reason,
            },
            source => MigrateError::Render {
                name: name.to_string(),
                source,
            },
        }
    }
}
