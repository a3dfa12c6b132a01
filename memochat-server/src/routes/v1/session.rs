use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::entities::{ChatSession, ChatStore, ModelStore, SessionStore};
use crate::error::ServerError;
use crate::extract::{CurrentUser, ValidatedJson};
use crate::schemas::v1::session::{
    CreateSessionRequest, ListSessionsQuery, MessageResponse, SessionDetailResponse, SessionEnvelope,
    SessionListResponse, SessionModelResponse, SessionResponse, UpdateSessionRequest,
};
use crate::services::chat::{session::new_session_id, ChatError};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 20;
const MAX_PAGE: i64 = 100;

#[derive(OpenApi)]
#[openapi(
    paths(list_sessions, create_session, get_session, update_session, delete_session),
    components(schemas(
        CreateSessionRequest,
        UpdateSessionRequest,
        SessionResponse,
        SessionModelResponse,
        SessionListResponse,
        SessionEnvelope,
        SessionDetailResponse,
        MessageResponse
    ))
)]
pub struct SessionApi;

/// Register session routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/sessions", get(list_sessions).post(create_session))
        .route(
            "/chat/sessions/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
}

#[utoipa::path(
    get,
    path = "/v1/chat/sessions",
    tag = "sessions",
    params(ListSessionsQuery),
    responses(
        (status = 200, description = "Caller's sessions, most recent first", body = SessionListResponse),
        (status = 401, description = "No caller identity"),
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<SessionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let offset = query.offset.unwrap_or(0).max(0);
    let sessions = state.store.list_sessions(&user.id, limit, offset).await?;
    Ok(Json(SessionListResponse {
        sessions: sessions.iter().map(|s| s.to_response()).collect(),
    }))
}

/// Create an empty session.  Chat turns normally create sessions themselves.
#[utoipa::path(
    post,
    path = "/v1/chat/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionEnvelope),
        (status = 400, description = "Validation failed or model not available"),
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateSessionRequest>,
) -> Result<Json<SessionEnvelope>, ServerError> {
    if state.store.get_active_model(&req.model_id).await?.is_none() {
        return Err(ChatError::ModelNotFound(req.model_id).into());
    }
    let now = Utc::now();
    let session = ChatSession {
        id: new_session_id(),
        user_id: user.id,
        title: req.title,
        model_id: req.model_id,
        category_id: None,
        created_at: now,
        updated_at: now,
    };
    state.store.create_session(session.clone()).await?;
    Ok(Json(SessionEnvelope {
        session: session.to_response(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/chat/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session with its messages", body = SessionDetailResponse),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<SessionDetailResponse>, ServerError> {
    let session = state
        .store
        .get_session(&user.id, &id)
        .await?
        .ok_or_else(|| ChatError::SessionNotFound(id.clone()))?;
    let messages = state.store.list_messages(&session.id).await?;
    Ok(Json(SessionDetailResponse {
        session: session.to_response(),
        messages: messages.iter().map(|m| m.to_response()).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/chat/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session renamed", body = SessionEnvelope),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSessionRequest>,
) -> Result<Json<SessionEnvelope>, ServerError> {
    if !state.store.update_session_title(&user.id, &id, &req.title).await? {
        return Err(ChatError::SessionNotFound(id).into());
    }
    let session = state
        .store
        .get_session(&user.id, &id)
        .await?
        .ok_or_else(|| ChatError::SessionNotFound(id.clone()))?;
    Ok(Json(SessionEnvelope {
        session: session.to_response(),
    }))
}

#[utoipa::path(
    delete,
    path = "/v1/chat/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session and its messages deleted", body = serde_json::Value),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.store.delete_session(&user.id, &id).await? {
        return Err(ChatError::SessionNotFound(id).into());
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
