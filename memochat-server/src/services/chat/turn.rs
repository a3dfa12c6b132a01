//! The part of a chat turn shared by the streaming and buffered endpoints.
//!
//! [`prepare_turn`] runs every fallible step that must complete before a
//! response starts: model lookup, context assembly, session resolution and
//! the two message inserts.  [`finalize_reply`] writes the terminal content.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::context::{assemble_context, ContextSelection};
use super::error::ChatError;
use super::prompt;
use super::session::{resolve_session, title_from_reply, SessionRequest};
use crate::entities::{AiModel, ChatMessage, ChatSession, ChatStore, MemoStore, MessageRole, ModelStore, SessionStore};
use crate::services::openrouter::CompletionRequest;

/// Everything the chat pipeline needs from persistence.
pub trait ChatBackend: SessionStore + ChatStore + MemoStore + ModelStore {}

impl<T: SessionStore + ChatStore + MemoStore + ModelStore> ChatBackend for T {}

/// A validated chat request, independent of the HTTP body shape.
#[derive(Debug, Clone, Default)]
pub struct TurnInput {
    pub message: String,
    pub model_id: String,
    pub memo_ids: Vec<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub session_id: Option<String>,
}

/// A turn whose user message and assistant placeholder are persisted.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub session: ChatSession,
    pub model: AiModel,
    pub message: String,
    /// Number of memo ids the caller attached, found or not.
    pub memo_count: usize,
    pub context: String,
    /// Row that receives the final assistant content.
    pub assistant_message_id: String,
}

impl ChatTurn {
    pub fn completion_request(&self, stream: bool) -> CompletionRequest {
        prompt::completion_request(&self.model, &self.message, &self.context, stream)
    }

    pub fn fallback_reply(&self) -> String {
        prompt::fallback_reply(&self.model, &self.message, self.memo_count)
    }
}

pub fn new_message_id() -> String {
    format!("msg_{}", Uuid::new_v4())
}

pub async fn prepare_turn<S: ChatBackend>(store: &Arc<S>, user_id: &str, input: TurnInput) -> Result<ChatTurn, ChatError> {
    let model = store
        .get_active_model(&input.model_id)
        .await?
        .ok_or_else(|| ChatError::ModelNotFound(input.model_id.clone()))?;

    let context = assemble_context(
        store.as_ref(),
        user_id,
        ContextSelection {
            memo_ids: &input.memo_ids,
            tags: &input.tags,
        },
    )
    .await?;

    let session = resolve_session(
        store,
        SessionRequest {
            user_id,
            session_id: input.session_id.as_deref(),
            first_message: &input.message,
            model_id: &model.id,
            category_id: input.category_id.as_deref(),
        },
    )
    .await?;

    // Both rows exist before any content is produced, so history read
    // mid-stream always shows the complete turn.
    store
        .append_message(ChatMessage {
            id: new_message_id(),
            session_id: session.id.clone(),
            role: MessageRole::User,
            content: input.message.clone(),
            model_id: model.id.clone(),
            memo_ids: input.memo_ids.clone(),
            created_at: Utc::now(),
        })
        .await?;

    let assistant_message_id = new_message_id();
    store
        .append_message(ChatMessage {
            id: assistant_message_id.clone(),
            session_id: session.id.clone(),
            role: MessageRole::Assistant,
            content: String::new(),
            model_id: model.id.clone(),
            memo_ids: Vec::new(),
            created_at: Utc::now(),
        })
        .await?;

    info!(
        session_id = %session.id,
        model_id = %model.id,
        memos = input.memo_ids.len(),
        tags = input.tags.len(),
        context_len = context.len(),
        "chat turn prepared"
    );

    Ok(ChatTurn {
        session,
        model,
        message: input.message,
        memo_count: input.memo_ids.len(),
        context,
        assistant_message_id,
    })
}

/// Write the terminal assistant content and optionally retitle the session.
///
/// Runs after the response has started, so failures are only logged.
pub async fn finalize_reply<S: ChatBackend>(store: &S, turn: &ChatTurn, content: &str, retitle: bool) {
    if let Err(e) = store.update_message_content(&turn.assistant_message_id, content).await {
        warn!(
            message_id = %turn.assistant_message_id,
            error = %e,
            "failed to persist assistant reply"
        );
    }

    if !retitle {
        return;
    }
    if let Some(title) = title_from_reply(content) {
        match store.update_session_title(&turn.session.user_id, &turn.session.id, &title).await {
            Ok(true) => {}
            Ok(false) => warn!(session_id = %turn.session.id, "session vanished before retitle"),
            Err(e) => warn!(session_id = %turn.session.id, error = %e, "failed to retitle session"),
        }
    }
}
