use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Field-level rejection of a write payload, reported per field on
    /// the wire.
    #[error("{field} {message}")]
    Validation { field: String, message: String },
    #[error("database error: {0}")]
    Database(#[from] conduit_db::DbError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> CoreError {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        CoreError::Internal(err.to_string())
    }
}
