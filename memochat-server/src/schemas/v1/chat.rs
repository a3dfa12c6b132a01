//! Request / response types for `/v1/chat` and `/v1/chat/stream`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::chat::TurnInput;
use crate::services::openrouter::Usage;

/// Body of both chat endpoints.  Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRequest {
    /// The user's message, 1 to 4000 characters.
    #[validate(length(min = 1, max = 4000, message = "message must be 1 to 4000 characters"))]
    pub message: String,
    /// Catalog id of the model to answer with, e.g. `"openai/gpt-4.1"`.
    #[validate(custom(function = "crate::extract::not_blank", message = "modelId is required"))]
    pub model_id: String,
    /// Memo ids attached explicitly (at most 50).
    #[serde(default)]
    #[validate(length(max = 50, message = "at most 50 memos can be attached"))]
    pub selected_memos: Vec<String>,
    /// Tags whose memos are added as context (at most 100).
    #[serde(default)]
    #[validate(length(max = 100, message = "at most 100 tags can be selected"))]
    pub selected_tags: Vec<String>,
    /// Category stored on a newly created session.
    #[serde(default)]
    pub selected_category: Option<String>,
    /// Accepted for client compatibility and ignored.
    #[serde(default)]
    pub selected_categories: Vec<String>,
    /// Continue this session; omitted, `null` or empty starts a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn into_turn_input(self) -> TurnInput {
        TurnInput {
            message: self.message,
            model_id: self.model_id,
            memo_ids: self.selected_memos,
            tags: self.selected_tags,
            category_id: self.selected_category.filter(|c| !c.is_empty()),
            session_id: self.session_id.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct UsageResponse {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl From<Usage> for UsageResponse {
    fn from(usage: Usage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Response of the buffered `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReplyResponse {
    pub response: String,
    pub session_id: String,
    pub usage: UsageResponse,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ChatRequest, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn optional_fields_default_and_empty_ids_are_dropped() {
        let req = parse(json!({ "message": "hi", "modelId": "openai/gpt-4.1", "sessionId": "" })).unwrap();
        assert!(req.validate().is_ok());
        let input = req.into_turn_input();
        assert!(input.memo_ids.is_empty());
        assert!(input.session_id.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse(json!({ "message": "hi", "modelId": "m", "temperature": 2 })).is_err());
        assert!(parse(json!({ "message": "hi", "modelId": "m", "selectedCategories": ["c1"] })).is_ok());
    }

    #[test]
    fn size_limits_are_enforced() {
        let too_many: Vec<String> = (0..51).map(|i| format!("m{i}")).collect();
        let req = parse(json!({ "message": "hi", "modelId": "m", "selectedMemos": too_many })).unwrap();
        assert!(req.validate().is_err());

        let req = parse(json!({ "message": "가".repeat(4000), "modelId": "m" })).unwrap();
        assert!(req.validate().is_ok());
        let req = parse(json!({ "message": "a".repeat(4001), "modelId": "m" })).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn blank_model_and_empty_message_fail() {
        let req = parse(json!({ "message": "hi", "modelId": "   " })).unwrap();
        assert!(req.validate().is_err());
        let req = parse(json!({ "message": "", "modelId": "m" })).unwrap();
        assert!(req.validate().is_err());
    }
}
