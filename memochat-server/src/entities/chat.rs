use std::future::Future;
use std::str::FromStr;

use crate::entities::dao::{ChatMessage, MessageRole};
use crate::entities::{decode_string_list, encode_string_list, parse_rfc3339_or_now, SqliteStore};

pub trait ChatStore: Send + Sync + 'static {
    fn append_message(
        &self,
        msg: ChatMessage,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Replace the content of an existing message (the assistant placeholder).
    fn update_message_content(
        &self,
        id: &str,
        content: &str,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Messages of a session in creation order.  Callers check ownership first.
    fn list_messages(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, sqlx::Error>> + Send;
}

impl ChatStore for SqliteStore {
    async fn append_message(&self, msg: ChatMessage) -> Result<(), sqlx::Error> {
        let created_at = msg.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, role, content, model_id, memo_ids, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&msg.id)
        .bind(&msg.session_id)
        .bind(msg.role.to_string())
        .bind(&msg.content)
        .bind(&msg.model_id)
        .bind(encode_string_list(&msg.memo_ids))
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_message_content(&self, id: &str, content: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE chat_messages SET content = ?1 WHERE id = ?2")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows: Vec<(String, String, String, String, String, String, String)> = sqlx::query_as(
            "SELECT id, session_id, role, content, model_id, memo_ids, created_at \
             FROM chat_messages WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, session_id, role, content, model_id, memo_ids, created_at)| ChatMessage {
                role: MessageRole::from_str(&role).unwrap_or_else(|_| {
                    tracing::warn!(raw = %role, message_id = %id, "unknown message role; treating as system");
                    MessageRole::System
                }),
                memo_ids: decode_string_list(&memo_ids, "chat_messages.memo_ids"),
                created_at: parse_rfc3339_or_now(created_at, "chat_messages.created_at"),
                id,
                session_id,
                content,
                model_id,
            })
            .collect())
    }
}
