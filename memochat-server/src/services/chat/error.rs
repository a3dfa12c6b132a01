use thiserror::Error;

/// Failures of the chat pipeline that happen before any event is emitted.
///
/// Once the first SSE event is on the wire, failures degrade to the fallback
/// reply instead of surfacing here.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The model id is unknown or the catalog entry is inactive.
    #[error("model `{0}` is not available")]
    ModelNotFound(String),

    /// The session does not exist or belongs to another user.
    #[error("chat session `{0}` not found")]
    SessionNotFound(String),

    #[error("failed to create chat session: {0}")]
    SessionCreateFailed(#[source] sqlx::Error),

    /// Fetching explicitly selected memos failed.
    #[error("failed to fetch attached memos: {0}")]
    ContextFetchFailed(#[source] sqlx::Error),

    /// Persisting the user message or assistant placeholder failed.
    #[error("failed to persist chat message: {0}")]
    Persistence(#[from] sqlx::Error),
}
