//! OpenRouter (OpenAI-compatible) chat completion client.
//!
//! [`OpenRouterClient::stream_chat`] returns a [`FrameStream`] that yields
//! decoded content deltas as they arrive; [`OpenRouterClient::complete`]
//! performs a single buffered request.

mod client;
mod error;
pub mod sse;
pub mod types;

pub use client::{FrameStream, OpenRouterClient};
pub use error::UpstreamError;
pub use sse::SseFrame;
pub use types::{CompletionMessage, CompletionRequest, CompletionResponse, Usage};
