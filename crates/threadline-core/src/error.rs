//! Error types for the Threadline system.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ThreadlineError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    /// The operation would leave a feed without any owner.
    #[error("Feed {feed_id} must keep at least one owner")]
    LastOwner { feed_id: Uuid },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ThreadlineResult<T> = Result<T, ThreadlineError>;
