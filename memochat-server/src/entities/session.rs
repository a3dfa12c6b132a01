use std::future::Future;

use chrono::Utc;

use crate::entities::dao::{ChatSession, SessionWithModel};
use crate::entities::{parse_rfc3339_or_now, SqliteStore};

pub trait SessionStore: Send + Sync + 'static {
    fn create_session(&self, session: ChatSession) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Load a session only if `user_id` owns it.
    fn get_session(&self, user_id: &str, id: &str) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Caller's sessions, most recently updated first.
    fn list_sessions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<SessionWithModel>, sqlx::Error>> + Send;
    /// Bump `updated_at` to now.
    fn touch_session(&self, user_id: &str, id: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Rename and bump `updated_at`.  Returns `false` when no owned row matched.
    fn update_session_title(
        &self,
        user_id: &str,
        id: &str,
        title: &str,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Delete the session and its messages.  Returns `false` when no owned row matched.
    fn delete_session(&self, user_id: &str, id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

type SessionRow = (String, String, String, String, Option<String>, String, String);

fn session_from_row(row: SessionRow) -> ChatSession {
    let (id, user_id, title, model_id, category_id, created_at, updated_at) = row;
    ChatSession {
        id,
        user_id,
        title,
        model_id,
        category_id,
        created_at: parse_rfc3339_or_now(created_at, "chat_sessions.created_at"),
        updated_at: parse_rfc3339_or_now(updated_at, "chat_sessions.updated_at"),
    }
}

impl SessionStore for SqliteStore {
    async fn create_session(&self, session: ChatSession) -> Result<(), sqlx::Error> {
        let created_at = session.created_at.to_rfc3339();
        let updated_at = session.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, title, model_id, category_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.title)
        .bind(&session.model_id)
        .bind(&session.category_id)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, user_id: &str, id: &str) -> Result<Option<ChatSession>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, user_id, title, model_id, category_id, created_at, updated_at \
             FROM chat_sessions WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(session_from_row))
    }

    async fn list_sessions(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SessionWithModel>, sqlx::Error> {
        let rows: Vec<(String, String, String, String, Option<String>, String, String, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT s.id, s.user_id, s.title, s.model_id, s.category_id, s.created_at, s.updated_at, \
                        m.name, m.provider \
                 FROM chat_sessions s LEFT JOIN ai_models m ON m.id = s.model_id \
                 WHERE s.user_id = ?1 \
                 ORDER BY s.updated_at DESC, s.id ASC \
                 LIMIT ?2 OFFSET ?3",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, title, model_id, category_id, created_at, updated_at, model_name, model_provider)| {
                    SessionWithModel {
                        session: session_from_row((id, user_id, title, model_id, category_id, created_at, updated_at)),
                        model_name,
                        model_provider,
                    }
                },
            )
            .collect())
    }

    async fn touch_session(&self, user_id: &str, id: &str) -> Result<(), sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query("UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2 AND user_id = ?3")
            .bind(&updated_at)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_session_title(&self, user_id: &str, id: &str, title: &str) -> Result<bool, sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE chat_sessions SET title = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        )
        .bind(title)
        .bind(&updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_session(&self, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM chat_messages WHERE session_id IN \
             (SELECT id FROM chat_sessions WHERE id = ?1 AND user_id = ?2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
