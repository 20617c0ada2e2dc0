use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{field} {message}")]
    Unprocessable { field: String, message: String },
    #[error("rate limited")]
    RateLimited,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Field errors use the errors-by-field body shape clients
            // render against form inputs.
            ApiError::Unprocessable { field, message } => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "errors": { field: [message] } })),
                )
                    .into_response();
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {msg}")),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limited".to_string()),
            ApiError::Internal(err) => {
                tracing::error!("API internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message, "message": message }))).into_response()
    }
}

impl From<conduit_core::error::CoreError> for ApiError {
    fn from(e: conduit_core::error::CoreError) -> Self {
        match e {
            conduit_core::error::CoreError::NotFound => ApiError::NotFound,
            conduit_core::error::CoreError::Forbidden => ApiError::Forbidden,
            conduit_core::error::CoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            conduit_core::error::CoreError::Validation { field, message } => {
                ApiError::Unprocessable { field, message }
            }
            conduit_core::error::CoreError::Database(e) => ApiError::Internal(anyhow::Error::new(e)),
            conduit_core::error::CoreError::Internal(msg) => {
                ApiError::Internal(anyhow::anyhow!(msg))
            }
        }
    }
}

impl From<conduit_db::DbError> for ApiError {
    fn from(e: conduit_db::DbError) -> Self {
        match e {
            conduit_db::DbError::NotFound => ApiError::NotFound,
            conduit_db::DbError::UniqueViolation => {
                ApiError::BadRequest("duplicate value".to_string())
            }
            conduit_db::DbError::Sqlx(e) => ApiError::Internal(anyhow::Error::new(e)),
        }
    }
}
