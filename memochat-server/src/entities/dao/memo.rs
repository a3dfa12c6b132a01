use chrono::{DateTime, Utc};

/// A row in the `memos` table.  Read-only from the chat pipeline.
#[derive(Debug, Clone)]
pub struct Memo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
