pub mod chat;
pub mod models;
pub mod preferences;
pub mod session;

use crate::middleware::auth;
use crate::state::AppState;
use utoipa::OpenApi;

use axum::{middleware, Router};
use std::sync::Arc;

/// Routes nested under `/v1`, gated by the optional API token.
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(chat::router())
        .merge(session::router())
        .merge(models::router())
        .merge(preferences::router())
        .route_layer(middleware::from_fn_with_state(state, auth::api_auth))
}

#[derive(OpenApi)]
#[openapi()]
pub struct V1Api;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = V1Api::openapi();
    spec.merge(chat::ChatApi::openapi());
    spec.merge(session::SessionApi::openapi());
    spec.merge(models::ModelsApi::openapi());
    spec.merge(preferences::PreferencesApi::openapi());
    spec
}
