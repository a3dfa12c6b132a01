//! Wire types for the `/chat/completions` endpoint.
//!
//! Only the fields this server reads are modelled; everything else in the
//! upstream payloads is ignored during deserialisation.

use serde::{Deserialize, Serialize};

use crate::entities::MessageRole;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub max_tokens: i64,
    pub temperature: f32,
    pub stream: bool,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// Content of the first choice, if any and non-empty.
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
    }
}

/// Body of a non-streamed completion.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionContent,
}

#[derive(Debug, Deserialize)]
pub struct CompletionContent {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting as reported by the upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl CompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_serialises_lowercase_roles() {
        let request = CompletionRequest {
            model: "openai/gpt-4.1".into(),
            messages: vec![CompletionMessage {
                role: MessageRole::System,
                content: "be brief".into(),
            }],
            max_tokens: 4000,
            temperature: 0.7,
            stream: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["stream"], true);
        assert_eq!(value["max_tokens"], 4000);
    }

    #[test]
    fn chunk_without_content_yields_nothing() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(chunk.into_content().is_none());

        let chunk: StreamChunk = serde_json::from_str(r#"{"id":"gen-1","choices":[]}"#).unwrap();
        assert!(chunk.into_content().is_none());
    }

    #[test]
    fn completion_without_usage_parses() {
        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#).unwrap();
        assert_eq!(body.first_content(), Some("hi"));
        assert!(body.usage.is_none());
    }
}
