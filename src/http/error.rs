//! HTTP error handling and response types.
//!
//! Every error body is `{"msg": ...}`, the service's wire format. Store
//! failures are reported as a fixed `Server Error` with details kept in the
//! server log only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::repository::RepositoryError;

/// JSON message body used for error responses and simple acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Msg {
    pub msg: String,
}

impl Msg {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Uniqueness conflict, reported as 400 like the rest of the 4xx family
    Conflict(String),
    /// Internal server error; detail is logged, never serialized
    Internal(String),
    /// Repository error mapped by taxonomy
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Msg::new(msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Msg::new(msg)),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, Msg::new(msg)),
            AppError::Internal(detail) => {
                error!("internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, Msg::new("Server Error"))
            }
            AppError::Repository(err) => repository_response(err),
        };

        (status, Json(body)).into_response()
    }
}

fn repository_response(err: RepositoryError) -> (StatusCode, Msg) {
    match err {
        RepositoryError::NotFound { message, .. } => (StatusCode::NOT_FOUND, Msg::new(message)),
        RepositoryError::ValidationError { message, .. } => {
            (StatusCode::BAD_REQUEST, Msg::new(message))
        }
        RepositoryError::ConflictError { message, .. } => {
            (StatusCode::BAD_REQUEST, Msg::new(message))
        }
        other => {
            // Connection, query, configuration and internal errors are all
            // store failures from the caller's point of view.
            error!("store failure: {other}");
            (StatusCode::INTERNAL_SERVER_ERROR, Msg::new("Server Error"))
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_validation_maps_to_400() {
        let (status, body) = repository_response(RepositoryError::validation("bad payload"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.msg, "bad payload");
    }

    #[test]
    fn test_conflict_maps_to_400() {
        let (status, _) = repository_response(RepositoryError::conflict("duplicate rank 1"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_failure_is_generic() {
        let (status, body) = repository_response(RepositoryError::query(
            "relation \"teacher_preferences\" does not exist",
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // Internal detail never reaches the caller.
        assert_eq!(body.msg, "Server Error");
    }
}
