//! Database-specific error types and conversions.

use threadline_core::error::ThreadlineError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity}")]
    Duplicate { entity: String },

    #[error("Corrupt row: {0}")]
    Decode(String),
}

impl From<DbError> for ThreadlineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ThreadlineError::NotFound { entity, id },
            DbError::Duplicate { entity } => ThreadlineError::AlreadyExists { entity },
            other => ThreadlineError::Database(other.to_string()),
        }
    }
}
