use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a chat message, stored and sent upstream as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Prompt framing only; the relay never persists it.
    System,
}

/// A single message row in the `chat_messages` table.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub model_id: String,
    /// Memos attached to a `user` message; empty on other roles.
    pub memo_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}
