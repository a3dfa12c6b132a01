//! Memo-aware chat routes.
//!
//! `POST /v1/chat/stream` answers with server-sent events; `POST /v1/chat`
//! returns the whole reply at once.  Both run the same pipeline: every
//! fallible step (validation, model lookup, memo context, session, message
//! inserts) completes before the response starts, so those failures are
//! ordinary JSON errors.  After that the stream only degrades, never fails.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, HeaderValue};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info_span, Instrument};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::extract::{CurrentUser, ValidatedJson};
use crate::schemas::v1::chat::{ChatReplyResponse, ChatRequest, UsageResponse};
use crate::services::chat::{self, StreamEvent};
use crate::state::AppState;

/// Events buffered between the relay task and the response body.
const RELAY_BUFFER: usize = 32;

#[derive(OpenApi)]
#[openapi(
    paths(chat_stream, chat_buffered),
    components(schemas(ChatRequest, ChatReplyResponse, UsageResponse, StreamEvent))
)]
pub struct ChatApi;

/// Register chat routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat_buffered))
        .route("/chat/stream", post(chat_stream))
}

/// Streamed chat turn.
///
/// Each SSE frame is `data: <StreamEvent JSON>`.  The first event always
/// carries the session id, the last is `{"type":"done"}`.
#[utoipa::path(
    post,
    path = "/v1/chat/stream",
    tag = "chat",
    request_body = ChatRequest,
    params(("x-user-id" = String, Header, description = "Caller identity")),
    responses(
        (status = 200, description = "Event stream of session / content / done events", content_type = "text/event-stream", body = StreamEvent),
        (status = 400, description = "Validation failed or model not available"),
        (status = 401, description = "No caller identity"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Session or context could not be prepared"),
    )
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Response, ServerError> {
    let turn = chat::prepare_turn(&state.store, &user.id, req.into_turn_input()).await?;

    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    let span = info_span!("chat_relay", user_id = %user.id, session_id = %turn.session.id);
    tokio::spawn(chat::run_relay(state.store.clone(), state.upstream.clone(), turn, tx).instrument(span));

    let events = ReceiverStream::new(rx).map(|event| Event::default().json_data(event));
    let mut response = Sse::new(events).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream; charset=utf-8"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(HeaderName::from_static("x-accel-buffering"), HeaderValue::from_static("no"));
    Ok(response)
}

/// Buffered chat turn.
#[utoipa::path(
    post,
    path = "/v1/chat",
    tag = "chat",
    request_body = ChatRequest,
    params(("x-user-id" = String, Header, description = "Caller identity")),
    responses(
        (status = 200, description = "Complete reply", body = ChatReplyResponse),
        (status = 400, description = "Validation failed or model not available"),
        (status = 401, description = "No caller identity"),
        (status = 404, description = "Session not found"),
        (status = 500, description = "Session or context could not be prepared"),
    )
)]
pub async fn chat_buffered(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatReplyResponse>, ServerError> {
    let turn = chat::prepare_turn(&state.store, &user.id, req.into_turn_input()).await?;
    let reply = chat::complete_turn(state.store.as_ref(), &state.upstream, turn).await;
    Ok(Json(ChatReplyResponse {
        response: reply.response,
        session_id: reply.session_id,
        usage: reply.usage.into(),
    }))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::entities::{ChatStore, MessageRole, SessionStore};
    use crate::routes;
    use crate::state::AppState;
    use crate::testing::{self, UpstreamScript};

    struct Harness {
        app: axum::Router,
        state: Arc<AppState>,
        upstream: testing::FakeUpstream,
    }

    async fn harness(script: UpstreamScript) -> Harness {
        let upstream = testing::fake_upstream(script).await;
        let state = testing::app_state(&upstream.base_url, Some("sk-test")).await;
        testing::seed_model(&state.store, "openai/gpt-4.1", "GPT-4.1", "openai", 8000).await;
        testing::seed_memo(&state.store, "m1", "alice", "Groceries", "Buy milk", &["home"]).await;
        Harness {
            app: routes::build(state.clone()),
            state,
            upstream,
        }
    }

    fn events_of(body: &[u8]) -> Vec<Value> {
        std::str::from_utf8(body)
            .unwrap()
            .split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| serde_json::from_str(frame.strip_prefix("data: ").unwrap()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn stream_emits_session_content_done_and_persists_one_pair() {
        let Harness { app, state, .. } = harness(UpstreamScript::Stream(testing::sse_body(&["Buy ", "milk ", "today."]))).await;

        let body = json!({ "message": "What do I need?", "modelId": "openai/gpt-4.1", "selectedMemos": ["m1"] });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("text/event-stream; charset=utf-8"));
        assert_eq!(response.header("cache-control"), Some("no-cache, no-transform"));
        assert_eq!(response.header("x-accel-buffering"), Some("no"));

        let events = events_of(&response.body);
        assert_eq!(events[0]["type"], "session");
        let session_id = events[0]["sessionId"].as_str().unwrap().to_owned();
        let contents: Vec<_> = events[1..4].iter().map(|e| e["content"].as_str().unwrap()).collect();
        assert_eq!(contents, ["Buy ", "milk ", "today."]);
        assert_eq!(events.len(), 5);
        assert_eq!(events[4], json!({ "type": "done" }));

        let messages = state.store.list_messages(&session_id).await.unwrap();
        let users = messages.iter().filter(|m| m.role == MessageRole::User).count();
        let assistants: Vec<_> = messages.iter().filter(|m| m.role == MessageRole::Assistant).collect();
        assert_eq!(users, 1);
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].content, "Buy milk today.");
    }

    #[tokio::test]
    async fn upstream_500_streams_fallback_and_stores_it() {
        let Harness { app, state, .. } = harness(UpstreamScript::Fail(StatusCode::INTERNAL_SERVER_ERROR)).await;

        let body = json!({ "message": "Summarise", "modelId": "openai/gpt-4.1", "selectedMemos": ["m1"] });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;
        let events = events_of(&response.body);

        assert_eq!(events.len(), 3);
        let fallback = events[1]["content"].as_str().unwrap();
        assert!(fallback.contains("GPT-4.1"));
        assert!(fallback.contains("openai"));
        assert!(fallback.contains("Summarise"));
        assert!(fallback.contains("첨부된 메모: 1개"));
        assert_eq!(events[2]["type"], "done");

        let session_id = events[0]["sessionId"].as_str().unwrap();
        let messages = state.store.list_messages(session_id).await.unwrap();
        assert_eq!(messages[1].content, fallback);
    }

    #[tokio::test]
    async fn foreign_session_is_404_before_any_event() {
        let Harness { app, state, .. } = harness(UpstreamScript::Stream(testing::sse_body(&["x"]))).await;
        testing::seed_session(&state.store, "session_bob", "bob", "openai/gpt-4.1").await;

        let body = json!({ "message": "hi", "modelId": "openai/gpt-4.1", "sessionId": "session_bob" });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.json()["kind"], "session_not_found");
        assert!(state.store.list_messages("session_bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn too_many_memos_is_rejected_before_any_work() {
        let Harness { app, state, .. } = harness(UpstreamScript::Stream(testing::sse_body(&["x"]))).await;

        let memos: Vec<String> = (0..51).map(|i| format!("m{i}")).collect();
        let body = json!({ "message": "hi", "modelId": "openai/gpt-4.1", "selectedMemos": memos });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["kind"], "validation_error");
        assert!(state.store.list_sessions("alice", 20, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_memo_lookup_is_500_and_writes_nothing() {
        let Harness { app, state, upstream } = harness(UpstreamScript::Stream(testing::sse_body(&["x"]))).await;
        sqlx::query("DROP TABLE memos").execute(state.store.pool()).await.unwrap();

        let body = json!({ "message": "hi", "modelId": "openai/gpt-4.1", "selectedMemos": ["m1"] });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json()["kind"], "context_fetch_failed");
        assert!(state.store.list_sessions("alice", 20, 0).await.unwrap().is_empty());
        let (messages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages")
            .fetch_one(state.store.pool())
            .await
            .unwrap();
        assert_eq!(messages, 0);
        assert!(upstream.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_identity_and_unknown_model_are_rejected() {
        let Harness { app, .. } = harness(UpstreamScript::Stream(testing::sse_body(&["x"]))).await;
        let body = json!({ "message": "hi", "modelId": "openai/gpt-4.1" });

        let response = testing::send(&app, testing::post_json("/v1/chat/stream", None, &body)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.json()["kind"], "authentication_required");

        let body = json!({ "message": "hi", "modelId": "nope/unknown" });
        let response = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json()["kind"], "model_not_found");
    }

    #[tokio::test]
    async fn second_turn_reuses_the_session() {
        let Harness { app, state, .. } = harness(UpstreamScript::Stream(testing::sse_body(&["A fairly long first answer."]))).await;

        let body = json!({ "message": "first", "modelId": "openai/gpt-4.1" });
        let first = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;
        let session_id = events_of(&first.body)[0]["sessionId"].as_str().unwrap().to_owned();

        let body = json!({ "message": "second", "modelId": "openai/gpt-4.1", "sessionId": session_id });
        let second = testing::send(&app, testing::post_json("/v1/chat/stream", Some("alice"), &body)).await;
        assert_eq!(events_of(&second.body)[0]["sessionId"], session_id.as_str());

        assert_eq!(state.store.list_messages(&session_id).await.unwrap().len(), 4);
        assert_eq!(state.store.list_sessions("alice", 20, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn buffered_endpoint_returns_reply_session_and_usage() {
        let Harness { app, state, upstream } = harness(UpstreamScript::Completion(json!({
            "choices": [{ "message": { "content": "You need milk." } }],
            "usage": { "prompt_tokens": 30, "completion_tokens": 4, "total_tokens": 34 }
        })))
        .await;

        let body = json!({ "message": "What do I need?", "modelId": "openai/gpt-4.1", "selectedMemos": ["m1"] });
        let response = testing::send(&app, testing::post_json("/v1/chat", Some("alice"), &body)).await;

        assert_eq!(response.status, StatusCode::OK);
        let reply = response.json();
        assert_eq!(reply["response"], "You need milk.");
        assert_eq!(reply["usage"]["total_tokens"], 34);
        let session_id = reply["sessionId"].as_str().unwrap();
        assert!(state.store.get_session("alice", session_id).await.unwrap().is_some());

        let sent = upstream.requests.lock().unwrap()[0].clone();
        assert_eq!(sent["stream"], false);
        assert_eq!(sent["max_tokens"], 4000);
        assert!(sent["messages"][1]["content"].as_str().unwrap().contains("제목: Groceries"));
    }
}
