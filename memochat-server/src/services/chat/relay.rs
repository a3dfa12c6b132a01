//! Streaming relay between the upstream completion stream and the client.
//!
//! The relay runs in its own task and talks to the HTTP response through a
//! bounded channel.  The response body owns the receiver, so a client that
//! disconnects drops it, and the relay sees the channel close at its next
//! suspension point.
//!
//! Event order on the channel is always `session`, zero or more `content`,
//! then `done`.  A cancelled run stops early without reordering anything
//! already sent and without writing the reply.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::turn::{finalize_reply, ChatBackend, ChatTurn};
use crate::services::openrouter::{OpenRouterClient, SseFrame, UpstreamError};

/// Application-level event sent to the browser as one SSE `data:` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Session {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Content {
        content: String,
    },
    Done,
}

/// How a relay run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RelayOutcome {
    /// Upstream finished (or broke after producing content).
    Completed,
    /// Upstream failed before producing content; the fallback was sent.
    Fallback,
    /// The client went away; nothing further was persisted.
    Cancelled,
}

pub async fn run_relay<S: ChatBackend>(
    store: Arc<S>,
    upstream: Arc<OpenRouterClient>,
    turn: ChatTurn,
    tx: mpsc::Sender<StreamEvent>,
) -> RelayOutcome {
    let outcome = relay(store.as_ref(), &upstream, &turn, &tx).await;
    info!(
        session_id = %turn.session.id,
        message_id = %turn.assistant_message_id,
        %outcome,
        "chat relay finished"
    );
    outcome
}

async fn relay<S: ChatBackend>(
    store: &S,
    upstream: &OpenRouterClient,
    turn: &ChatTurn,
    tx: &mpsc::Sender<StreamEvent>,
) -> RelayOutcome {
    let session_event = StreamEvent::Session {
        session_id: turn.session.id.clone(),
    };
    if tx.send(session_event).await.is_err() {
        return RelayOutcome::Cancelled;
    }

    let request = turn.completion_request(true);
    let opened = tokio::select! {
        biased;
        _ = tx.closed() => return RelayOutcome::Cancelled,
        opened = upstream.stream_chat(&request) => opened,
    };
    let mut frames = match opened {
        Ok(frames) => frames,
        Err(e) => {
            log_upstream_failure(&e);
            return send_fallback(store, turn, tx).await;
        }
    };

    let mut accumulated = String::new();
    loop {
        let frame = tokio::select! {
            biased;
            _ = tx.closed() => return RelayOutcome::Cancelled,
            frame = frames.next_frame() => frame,
        };
        match frame {
            Some(Ok(SseFrame::Delta(text))) => {
                accumulated.push_str(&text);
                if tx.send(StreamEvent::Content { content: text }).await.is_err() {
                    return RelayOutcome::Cancelled;
                }
            }
            Some(Ok(SseFrame::Done)) => break,
            None => {
                debug!(session_id = %turn.session.id, "upstream closed without [DONE]");
                break;
            }
            Some(Err(e)) if accumulated.is_empty() => {
                log_upstream_failure(&e);
                return send_fallback(store, turn, tx).await;
            }
            Some(Err(e)) => {
                warn!(error = %e, received = accumulated.len(), "upstream stream broke; keeping partial reply");
                break;
            }
        }
    }

    if tx.send(StreamEvent::Done).await.is_err() {
        return RelayOutcome::Cancelled;
    }
    finalize_reply(store, turn, &accumulated, true).await;
    RelayOutcome::Completed
}

async fn send_fallback<S: ChatBackend>(store: &S, turn: &ChatTurn, tx: &mpsc::Sender<StreamEvent>) -> RelayOutcome {
    let content = turn.fallback_reply();
    if tx.send(StreamEvent::Content { content: content.clone() }).await.is_err() {
        return RelayOutcome::Cancelled;
    }
    finalize_reply(store, turn, &content, false).await;
    if tx.send(StreamEvent::Done).await.is_err() {
        // The reply is already stored; only the terminator was lost.
        return RelayOutcome::Cancelled;
    }
    RelayOutcome::Fallback
}

fn log_upstream_failure(e: &UpstreamError) {
    match e {
        UpstreamError::MissingApiKey => debug!("no upstream credential; answering with fallback"),
        _ => warn!(error = %e, "upstream completion failed; answering with fallback"),
    }
}
