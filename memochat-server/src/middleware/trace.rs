use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON bodies up to this size are logged verbatim.
const MAX_LOGGED_BODY: usize = 1024;

/// Same ceiling as axum's default `Json` body limit.
const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

#[derive(Debug)]
struct BodyTooLarge;

pub async fn trace_middleware(State(_state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    // Reuse a caller-supplied trace id when it is a valid UUID.
    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");
        let (parts, body) = req.into_parts();
        let body = match log_json_body("request", &parts.headers, body).await {
            Ok(body) => body,
            Err(BodyTooLarge) => {
                info!(limit = MAX_BUFFERED_BODY, "request body too large");
                let mut response = (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({ "error": "request body too large", "kind": "payload_too_large" })),
                )
                    .into_response();
                if let Some(value) = trace_header {
                    response.headers_mut().insert(X_TRACE_ID, value);
                }
                return response;
            }
        };
        let mut req = Request::from_parts(parts, body);
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let response = next.run(req).await;

        let (parts, body) = response.into_parts();
        let streaming = is_event_stream(&parts.headers);
        let body = if streaming {
            // Event streams are passed through untouched; buffering them
            // would hold every frame until the relay finished.
            body
        } else {
            log_json_body("response", &parts.headers, body)
                .await
                .unwrap_or_else(|BodyTooLarge| Body::empty())
        };
        let mut response = Response::from_parts(parts, body);
        if let Some(value) = trace_header {
            response.headers_mut().insert(X_TRACE_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            streaming,
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    content_type(headers).starts_with("text/event-stream")
}

/// Buffer and log JSON bodies; anything else is returned unread.
///
/// Reading stops at [`MAX_BUFFERED_BODY`] bytes.
async fn log_json_body(direction: &str, headers: &HeaderMap, body: Body) -> Result<Body, BodyTooLarge> {
    let content_type = content_type(headers);
    if !content_type.contains("application/json") {
        return Ok(body);
    }

    let bytes = match Limited::new(body, MAX_BUFFERED_BODY).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => return Err(BodyTooLarge),
        Err(_) => return Ok(Body::from(Bytes::new())),
    };

    if bytes.len() < MAX_LOGGED_BODY {
        if let Ok(text) = std::str::from_utf8(&bytes) {
            info!("{} body: {}", direction, text);
        }
    } else {
        debug!("{} body: [skipped: type={}, size={}]", direction, content_type, bytes.len());
    }

    Ok(Body::from(bytes))
}
