//! Shared fixtures for unit and router tests.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::config::Config;
use crate::entities::{AiModel, ChatSession, ModelPricing, ModelStore, SessionStore, SqliteStore};
use crate::services::openrouter::OpenRouterClient;
use crate::state::AppState;

pub async fn store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:")
        .await
        .expect("in-memory store")
}

pub fn model(id: &str, name: &str, provider: &str, max_tokens: i64) -> AiModel {
    let now = Utc::now();
    AiModel {
        id: id.into(),
        name: name.into(),
        provider: provider.into(),
        description: String::new(),
        pricing: ModelPricing::default(),
        features: vec!["chat".into()],
        is_free: false,
        max_tokens,
        context_length: 128_000,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_model(store: &SqliteStore, id: &str, name: &str, provider: &str, max_tokens: i64) {
    store
        .upsert_model(model(id, name, provider, max_tokens))
        .await
        .expect("seed model");
}

pub async fn seed_session(store: &SqliteStore, id: &str, user_id: &str, model_id: &str) {
    let now = Utc::now();
    store
        .create_session(ChatSession {
            id: id.into(),
            user_id: user_id.into(),
            title: "seeded".into(),
            model_id: model_id.into(),
            category_id: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("seed session");
}

pub async fn seed_memo(store: &SqliteStore, id: &str, user_id: &str, title: &str, content: &str, tags: &[&str]) {
    let now = Utc::now().to_rfc3339();
    let tags: Vec<&str> = tags.to_vec();
    sqlx::query(
        "INSERT INTO memos (id, user_id, title, content, tags, category_id, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)",
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(serde_json::to_string(&tags).expect("tags json"))
    .bind(&now)
    .execute(store.pool())
    .await
    .expect("seed memo");
}

/// Application state wired to an in-memory store and the given upstream.
pub async fn app_state(upstream_url: &str, api_key: Option<&str>) -> Arc<AppState> {
    let config = Config::for_tests(upstream_url, api_key);
    let upstream = OpenRouterClient::new(config.upstream.clone()).expect("upstream client");
    Arc::new(AppState {
        config: Arc::new(config),
        store: Arc::new(store().await),
        upstream: Arc::new(upstream),
    })
}

// ── fake completion service ──────────────────────────────────────────────────

/// What the fake upstream answers on `POST /chat/completions`.
#[derive(Debug, Clone)]
pub enum UpstreamScript {
    /// Raw SSE body chunks, written in order.
    Stream(Vec<String>),
    /// Non-streaming JSON completion body.
    Completion(Value),
    Fail(StatusCode),
}

pub struct FakeUpstream {
    pub base_url: String,
    /// Every JSON request body received, in arrival order.
    pub requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct FakeState {
    script: UpstreamScript,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Serve `script` on an ephemeral local port.
pub async fn fake_upstream(script: UpstreamScript) -> FakeUpstream {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/chat/completions", post(fake_completions))
        .with_state(FakeState {
            script,
            requests: requests.clone(),
        });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    FakeUpstream {
        base_url: format!("http://{addr}"),
        requests,
    }
}

async fn fake_completions(State(fake): State<FakeState>, Json(body): Json<Value>) -> Response {
    fake.requests.lock().expect("requests lock").push(body);
    match fake.script {
        UpstreamScript::Stream(chunks) => {
            let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::convert::Infallible>));
            Response::builder()
                .header(header::CONTENT_TYPE, "text/event-stream")
                .body(Body::from_stream(stream))
                .expect("fake stream response")
        }
        UpstreamScript::Completion(value) => Json(value).into_response(),
        UpstreamScript::Fail(status) => (status, Json(json!({ "error": { "message": "boom" } }))).into_response(),
    }
}

/// One upstream `data:` frame carrying `text` as a content delta.
pub fn delta_frame(text: &str) -> String {
    format!("data: {}\n\n", json!({ "choices": [{ "delta": { "content": text } }] }))
}

/// A complete upstream stream: one frame per delta followed by `[DONE]`.
pub fn sse_body(deltas: &[&str]) -> Vec<String> {
    let mut frames: Vec<String> = deltas.iter().map(|d| delta_frame(d)).collect();
    frames.push("data: [DONE]\n\n".to_owned());
    frames
}

// ── router helpers ───────────────────────────────────────────────────────────

/// A fully buffered response from [`send`].
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// Build a request with an optional caller identity and JSON body.
pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<&Value>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn post_json(uri: &str, user: Option<&str>, body: &Value) -> axum::http::Request<Body> {
    request("POST", uri, user, Some(body))
}

/// Drive `app` with one request and collect the whole response body.
pub async fn send(app: &Router, req: axum::http::Request<Body>) -> TestResponse {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let response = app.clone().oneshot(req).await.expect("infallible router");
    let (parts, body) = response.into_parts();
    let body = body.collect().await.expect("response body").to_bytes();
    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}
