//! Error types for the CRUD engine.

use thiserror::Error;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Failures surfaced by the generic engine. None are retried locally.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Opening a connection failed.
    #[error("failed to acquire database connection: {source}")]
    Connection {
        #[source]
        source: rusqlite::Error,
    },

    /// Preparing, executing or mapping a statement failed.
    #[error("error during {operation} on {table}: {source}")]
    Statement {
        operation: &'static str,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// An insert reported zero affected rows.
    #[error("failed to insert entity into {table}")]
    NoRowsInserted { table: String },

    /// The driver returned no usable generated key.
    #[error("failed to get generated id for {table}")]
    MissingGeneratedId { table: String },

    /// An update matched no row.
    #[error("entity not found for update in {table}")]
    NotFoundForUpdate { table: String },

    /// The table name is not a plain SQL identifier.
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),
}

impl PersistenceError {
    pub(crate) fn statement(operation: &'static str, table: &str, source: rusqlite::Error) -> Self {
        PersistenceError::Statement {
            operation,
            table: table.to_string(),
            source,
        }
    }
}
