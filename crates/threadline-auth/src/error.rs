//! Authentication and authorization error types.

use thiserror::Error;
use threadline_core::error::ThreadlineError;

use crate::permission::DenialReason;

#[derive(Debug, Error)]
pub enum AuthError {
    /// A permission check denied the action.
    #[error("{}", .0.message())]
    PermissionDenied(DenialReason),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// The denial reason, if this error came from a permission check.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            AuthError::PermissionDenied(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<AuthError> for ThreadlineError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::PermissionDenied(reason) => ThreadlineError::AuthorizationDenied {
                reason: reason.message().to_string(),
            },
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                ThreadlineError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => ThreadlineError::Internal(msg),
        }
    }
}
