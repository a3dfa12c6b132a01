use chrono::{DateTime, Utc};

/// A row in the `chat_sessions` table.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: String,
    /// Owner; never changes after creation.
    pub user_id: String,
    pub title: String,
    pub model_id: String,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A session joined with the display fields of its catalog model.
///
/// The model columns are `None` when the catalog has no row for `model_id`.
#[derive(Debug, Clone)]
pub struct SessionWithModel {
    pub session: ChatSession,
    pub model_name: Option<String>,
    pub model_provider: Option<String>,
}
