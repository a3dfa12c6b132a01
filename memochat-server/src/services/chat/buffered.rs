//! Non-streaming caller of the chat pipeline.

use tracing::warn;

use super::turn::{finalize_reply, ChatBackend, ChatTurn};
use crate::services::openrouter::{OpenRouterClient, Usage};

/// Sent when the upstream answers successfully but without any content.
pub const EMPTY_REPLY: &str = "응답을 생성할 수 없습니다.";

#[derive(Debug, Clone)]
pub struct BufferedReply {
    pub response: String,
    pub session_id: String,
    pub usage: Usage,
}

/// Request a complete reply, persist it and return it.
///
/// Upstream failures yield the fallback reply with zero usage.  The session
/// keeps the title taken from the user's first message.
pub async fn complete_turn<S: ChatBackend>(store: &S, upstream: &OpenRouterClient, turn: ChatTurn) -> BufferedReply {
    let (response, usage) = match upstream.complete(&turn.completion_request(false)).await {
        Ok(body) => {
            let usage = body.usage.unwrap_or_default();
            match body.first_content() {
                Some(content) => (content.to_owned(), usage),
                None => (EMPTY_REPLY.to_owned(), usage),
            }
        }
        Err(e) => {
            warn!(error = %e, session_id = %turn.session.id, "buffered completion failed; answering with fallback");
            (turn.fallback_reply(), Usage::default())
        }
    };

    finalize_reply(store, &turn, &response, false).await;
    BufferedReply {
        response,
        session_id: turn.session.id,
        usage,
    }
}
