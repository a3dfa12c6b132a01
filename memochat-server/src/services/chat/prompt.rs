//! Prompt framing, upstream request parameters and the fallback reply.

use crate::entities::{AiModel, MessageRole};
use crate::services::openrouter::{CompletionMessage, CompletionRequest};

const SYSTEM_PROMPT: &str = "당신은 사용자의 메모를 분석하고 질문에 답변하는 도우미입니다.\n\
사용자가 첨부한 메모 내용을 참고하여 정확하고 도움이 되는 답변을 제공해주세요.\n\
한국어로 답변해주세요.";

/// Upper bound on `max_tokens` regardless of the model's own ceiling.
pub const MAX_COMPLETION_TOKENS: i64 = 4000;
pub const TEMPERATURE: f32 = 0.7;

pub fn completion_request(model: &AiModel, message: &str, context: &str, stream: bool) -> CompletionRequest {
    CompletionRequest {
        model: model.id.clone(),
        messages: vec![
            CompletionMessage {
                role: MessageRole::System,
                content: SYSTEM_PROMPT.to_owned(),
            },
            CompletionMessage {
                role: MessageRole::User,
                content: format!("{message}{context}"),
            },
        ],
        max_tokens: model.max_tokens.min(MAX_COMPLETION_TOKENS),
        temperature: TEMPERATURE,
        stream,
    }
}

/// Reply used when the upstream cannot produce one.
pub fn fallback_reply(model: &AiModel, message: &str, memo_count: usize) -> String {
    format!(
        "[{}] 개발 중인 모델입니다. 실제 구현 시 {} API를 호출합니다.\n\n질문: {}\n\n첨부된 메모: {}개",
        model.name, model.provider, message, memo_count
    )
}
