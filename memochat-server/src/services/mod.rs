//! Domain services sitting between the HTTP handlers and the stores.
//!
//! - [`openrouter`] – client for the OpenAI-compatible completion API.
//! - [`chat`] – the chat turn pipeline: context assembly, session
//!   resolution, streaming relay and finalization.

pub mod chat;
pub mod openrouter;
