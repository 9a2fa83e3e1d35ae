//! Database error types.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A unique column already holds this value
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// The write would contradict state already on the record
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DatabaseError {
    /// Turn a unique-constraint violation into [`DatabaseError::AlreadyExists`].
    pub(crate) fn unique(err: sqlx::Error, entity: &'static str, key: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    key: key.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(err)
    }

    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
