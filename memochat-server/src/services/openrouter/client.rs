use std::collections::VecDeque;

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::error::UpstreamError;
use super::sse::{SseDecoder, SseFrame};
use super::types::{CompletionRequest, CompletionResponse};
use crate::config::UpstreamConfig;

/// Thin wrapper over a shared [`reqwest::Client`] configured for OpenRouter.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    config: UpstreamConfig,
}

impl OpenRouterClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        // No overall timeout: a streamed completion may legitimately run for
        // minutes.  Only connection setup is bounded.
        let http = Client::builder()
            .user_agent(concat!("memochat-server/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn post(&self, body: &CompletionRequest) -> Result<RequestBuilder, UpstreamError> {
        let api_key = self.config.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        Ok(self
            .http
            .post(url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.app_url)
            .header("X-Title", &self.config.app_title)
            .json(body))
    }

    /// Open a streamed completion.  Resolves once response headers arrive.
    pub async fn stream_chat(&self, body: &CompletionRequest) -> Result<FrameStream, UpstreamError> {
        let response = self.post(body)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }
        debug!(model = %body.model, "upstream stream opened");
        Ok(FrameStream::new(response.bytes_stream().boxed()))
    }

    /// Perform a buffered (non-streamed) completion.
    pub async fn complete(&self, body: &CompletionRequest) -> Result<CompletionResponse, UpstreamError> {
        let response = self.post(body)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }
}

/// Decoded frames of an open upstream stream.
///
/// [`FrameStream::next_frame`] is cancel safe: dropping the returned future
/// loses no already-decoded frames.
pub struct FrameStream {
    body: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
    eof: bool,
}

impl FrameStream {
    fn new(body: BoxStream<'static, reqwest::Result<bytes::Bytes>>) -> Self {
        Self {
            body,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            eof: false,
        }
    }

    /// Next frame, or `None` once the upstream body has ended.
    pub async fn next_frame(&mut self) -> Option<Result<SseFrame, UpstreamError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(Ok(frame));
            }
            if self.eof {
                return None;
            }
            match self.body.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.push(&chunk)),
                Some(Err(e)) => {
                    self.eof = true;
                    return Some(Err(UpstreamError::Transport(e)));
                }
                None => {
                    self.eof = true;
                    self.pending.extend(self.decoder.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::entities::MessageRole;
    use crate::services::openrouter::CompletionMessage;
    use crate::testing::{self, UpstreamScript};
    use axum::http::StatusCode;
    use serde_json::json;

    fn request(stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: "openai/gpt-4.1".into(),
            messages: vec![CompletionMessage {
                role: MessageRole::User,
                content: "hi".into(),
            }],
            max_tokens: 100,
            temperature: 0.7,
            stream,
        }
    }

    fn client(base_url: &str, api_key: Option<&str>) -> OpenRouterClient {
        OpenRouterClient::new(Config::for_tests(base_url, api_key).upstream).unwrap()
    }

    #[tokio::test]
    async fn stream_yields_deltas_until_done() {
        let fake = testing::fake_upstream(UpstreamScript::Stream(testing::sse_body(&["Hel", "lo"]))).await;
        let mut frames = client(&fake.base_url, Some("sk-test")).stream_chat(&request(true)).await.unwrap();

        let mut seen = Vec::new();
        while let Some(frame) = frames.next_frame().await {
            seen.push(frame.unwrap());
        }
        assert_eq!(
            seen,
            vec![SseFrame::Delta("Hel".into()), SseFrame::Delta("lo".into()), SseFrame::Done]
        );

        let sent = fake.requests.lock().unwrap()[0].clone();
        assert_eq!(sent["stream"], true);
        assert_eq!(sent["model"], "openai/gpt-4.1");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let fake = testing::fake_upstream(UpstreamScript::Fail(StatusCode::INTERNAL_SERVER_ERROR)).await;
        let err = client(&fake.base_url, Some("sk-test"))
            .stream_chat(&request(true))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, UpstreamError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn missing_key_never_calls_upstream() {
        let fake = testing::fake_upstream(UpstreamScript::Stream(testing::sse_body(&["x"]))).await;
        let err = client(&fake.base_url, None).stream_chat(&request(true)).await.err().unwrap();
        assert!(matches!(err, UpstreamError::MissingApiKey));
        assert!(fake.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn buffered_completion_reads_content_and_usage() {
        let fake = testing::fake_upstream(UpstreamScript::Completion(json!({
            "choices": [{ "message": { "role": "assistant", "content": "answer" } }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
        })))
        .await;
        let body = client(&fake.base_url, Some("sk-test")).complete(&request(false)).await.unwrap();
        assert_eq!(body.first_content(), Some("answer"));
        assert_eq!(body.usage.unwrap().total_tokens, 15);
    }
}
