//! Resolves the chat session a turn is attributed to.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ChatError;
use crate::entities::{ChatSession, SessionStore};

const TITLE_CHARS: usize = 50;
/// Replies at or below this many characters never retitle the session.
const REPLY_TITLE_MIN_CHARS: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct SessionRequest<'a> {
    pub user_id: &'a str,
    pub session_id: Option<&'a str>,
    pub first_message: &'a str,
    pub model_id: &'a str,
    pub category_id: Option<&'a str>,
}

/// Load the caller's session or create a new one.
///
/// An existing session is touched in the background; a failed touch is
/// logged and otherwise ignored.
pub async fn resolve_session<S: SessionStore>(store: &Arc<S>, req: SessionRequest<'_>) -> Result<ChatSession, ChatError> {
    if let Some(id) = req.session_id {
        let session = store
            .get_session(req.user_id, id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(id.to_owned()))?;

        let store = Arc::clone(store);
        let (user_id, id) = (session.user_id.clone(), session.id.clone());
        tokio::spawn(async move {
            if let Err(e) = store.touch_session(&user_id, &id).await {
                warn!(session_id = %id, error = %e, "failed to touch chat session");
            }
        });
        return Ok(session);
    }

    let now = Utc::now();
    let session = ChatSession {
        id: new_session_id(),
        user_id: req.user_id.to_owned(),
        title: title_from_message(req.first_message),
        model_id: req.model_id.to_owned(),
        category_id: req.category_id.map(str::to_owned),
        created_at: now,
        updated_at: now,
    };
    store
        .create_session(session.clone())
        .await
        .map_err(ChatError::SessionCreateFailed)?;
    debug!(session_id = %session.id, "created chat session");
    Ok(session)
}

pub fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4())
}

/// First 50 characters of the opening message, with `...` when cut.
pub fn title_from_message(message: &str) -> String {
    if message.chars().count() > TITLE_CHARS {
        format!("{}...", head(message))
    } else {
        message.to_owned()
    }
}

/// Title derived from a completed reply, or `None` when the reply is too short.
///
/// The ellipsis is appended even when the reply fits in 50 characters.
pub fn title_from_reply(reply: &str) -> Option<String> {
    (reply.chars().count() > REPLY_TITLE_MIN_CHARS).then(|| format!("{}...", head(reply)))
}

fn head(text: &str) -> String {
    text.chars().take(TITLE_CHARS).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{SessionWithModel, SqliteStore};
    use crate::testing;
    use std::time::Duration;

    fn request<'a>(user_id: &'a str, session_id: Option<&'a str>) -> SessionRequest<'a> {
        SessionRequest {
            user_id,
            session_id,
            first_message: "How do I plan next week?",
            model_id: "openai/gpt-4.1",
            category_id: None,
        }
    }

    #[test]
    fn long_message_title_is_cut_to_fifty_plus_ellipsis() {
        let message = "a".repeat(60);
        let title = title_from_message(&message);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));

        let short = "b".repeat(40);
        assert_eq!(title_from_message(&short), short);
    }

    #[test]
    fn title_truncation_counts_characters_not_bytes() {
        let message = "가".repeat(51);
        assert_eq!(title_from_message(&message), format!("{}...", "가".repeat(50)));
    }

    #[test]
    fn short_replies_keep_the_title() {
        assert!(title_from_reply("Sure, here you go.").is_none());
        assert_eq!(
            title_from_reply("This reply is long enough.").as_deref(),
            Some("This reply is long enough....")
        );
    }

    #[tokio::test]
    async fn new_session_takes_title_and_category() {
        let store = Arc::new(testing::store().await);
        let mut req = request("alice", None);
        req.category_id = Some("cat_1");

        let session = resolve_session(&store, req).await.unwrap();
        assert!(session.id.starts_with("session_"));
        assert_eq!(session.title, "How do I plan next week?");

        let stored = store.get_session("alice", &session.id).await.unwrap().unwrap();
        assert_eq!(stored.category_id.as_deref(), Some("cat_1"));
        assert_eq!(stored.model_id, "openai/gpt-4.1");
    }

    /// Delegates reads and refuses every insert.
    struct ReadOnlySessions(SqliteStore);

    impl SessionStore for ReadOnlySessions {
        async fn create_session(&self, _session: ChatSession) -> Result<(), sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }

        async fn get_session(&self, user_id: &str, id: &str) -> Result<Option<ChatSession>, sqlx::Error> {
            self.0.get_session(user_id, id).await
        }

        async fn list_sessions(&self, user_id: &str, limit: i64, offset: i64) -> Result<Vec<SessionWithModel>, sqlx::Error> {
            self.0.list_sessions(user_id, limit, offset).await
        }

        async fn touch_session(&self, user_id: &str, id: &str) -> Result<(), sqlx::Error> {
            self.0.touch_session(user_id, id).await
        }

        async fn update_session_title(&self, user_id: &str, id: &str, title: &str) -> Result<bool, sqlx::Error> {
            self.0.update_session_title(user_id, id, title).await
        }

        async fn delete_session(&self, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
            self.0.delete_session(user_id, id).await
        }
    }

    #[tokio::test]
    async fn failed_insert_is_fatal() {
        let inner = testing::store().await;
        let store = Arc::new(ReadOnlySessions(inner.clone()));

        let err = resolve_session(&store, request("alice", None)).await.unwrap_err();
        assert!(matches!(err, ChatError::SessionCreateFailed(_)));
        assert!(inner.list_sessions("alice", 20, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn foreign_session_is_not_found() {
        let store = Arc::new(testing::store().await);
        testing::seed_session(&store, "session_b", "bob", "openai/gpt-4.1").await;

        let err = resolve_session(&store, request("alice", Some("session_b"))).await.unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound(id) if id == "session_b"));
    }

    #[tokio::test]
    async fn existing_session_is_touched_in_background() {
        let store: Arc<SqliteStore> = Arc::new(testing::store().await);
        testing::seed_session(&store, "session_a", "alice", "openai/gpt-4.1").await;
        sqlx::query("UPDATE chat_sessions SET updated_at = '2020-01-01T00:00:00+00:00'")
            .execute(store.pool())
            .await
            .unwrap();

        let session = resolve_session(&store, request("alice", Some("session_a"))).await.unwrap();
        assert_eq!(session.title, "seeded");

        let mut touched = false;
        for _ in 0..50 {
            let current = store.get_session("alice", "session_a").await.unwrap().unwrap();
            if current.updated_at.timestamp() > 1_600_000_000 {
                touched = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(touched);
    }
}
