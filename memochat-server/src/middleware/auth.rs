//! Optional shared bearer-token checks.
//!
//! Each gate is a no-op while its token is unset, matching a local
//! development setup behind a trusted proxy.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Guards `/v1` with `MEMOCHAT_API_TOKEN`.
pub async fn api_auth(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    check_bearer(state.config.api_token.as_deref(), req, next).await
}

/// Guards `/admin` with `MEMOCHAT_ADMIN_TOKEN`.
pub async fn admin_auth(State(state): State<Arc<AppState>>, req: Request<Body>, next: Next) -> Response {
    check_bearer(state.config.admin_token.as_deref(), req, next).await
}

async fn check_bearer(expected: Option<&str>, req: Request<Body>, next: Next) -> Response {
    if let Some(expected_token) = expected {
        let provided = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match provided {
            Some(token) if token == expected_token => {}
            _ => {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "unauthorised", "kind": "authentication_required" })),
                )
                    .into_response();
            }
        }
    }
    next.run(req).await
}
