//! Database-specific error types and conversions.

use coursecraft_core::error::CoreError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Token has expired")]
    TokenExpired,
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::AlreadyExists { entity } => CoreError::AlreadyExists { entity },
            DbError::TokenExpired => CoreError::TokenExpired,
            other => CoreError::Database(other.to_string()),
        }
    }
}

/// Whether a SurrealDB error is a duplicate-record condition: either a
/// unique-index violation or a CREATE against an existing record id.
pub(crate) fn is_unique_violation(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("already contains") || msg.contains("already exists")
}
