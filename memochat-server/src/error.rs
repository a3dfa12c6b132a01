//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON body `{"error": <message>, "kind": <kind>}` with an appropriate
//! status code.  `kind` is stable and meant for programmatic handling.
//!
//! **Security note:** Internal errors (Database, Internal, and the 5xx chat
//! errors) are logged with full detail but only a generic message is
//! returned to the caller so that SQL or other implementation details never
//! leak to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::chat::ChatError;

/// All errors that can occur in the memochat-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// No caller identity on the request.
    #[error("authentication required: {0}")]
    Unauthorized(String),

    /// The request body or query failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller referenced a resource that does not exist (or is not theirs).
    #[error("not found: {0}")]
    NotFound(String),

    /// Propagated from the chat pipeline before a response started.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Propagated from the SQLite (or other) store.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Unauthorized(_) => "authentication_required",
            ServerError::Validation(_) => "validation_error",
            ServerError::NotFound(_) => "not_found",
            ServerError::Chat(e) => match e {
                ChatError::ModelNotFound(_) => "model_not_found",
                ChatError::SessionNotFound(_) => "session_not_found",
                ChatError::SessionCreateFailed(_) => "session_create_failed",
                ChatError::ContextFetchFailed(_) => "context_fetch_failed",
                ChatError::Persistence(_) => "internal_error",
            },
            ServerError::Database(_) | ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ServerError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Chat(e @ ChatError::ModelNotFound(_)) => (StatusCode::BAD_REQUEST, e.to_string()),
            ServerError::Chat(e @ ChatError::SessionNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()),

            // Internal errors: log the full detail, return a generic message.
            ServerError::Chat(e @ ChatError::SessionCreateFailed(_)) => {
                error!(error = %e, "chat session insert failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to create chat session".to_owned())
            }
            ServerError::Chat(e @ ChatError::ContextFetchFailed(_)) => {
                error!(error = %e, "memo context lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "failed to load attached memos".to_owned())
            }
            ServerError::Chat(e @ ChatError::Persistence(_)) => {
                error!(error = %e, "chat persistence failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
        };
        (status, Json(json!({ "error": client_message, "kind": self.kind() }))).into_response()
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServerError::Validation(errors.to_string())
    }
}
