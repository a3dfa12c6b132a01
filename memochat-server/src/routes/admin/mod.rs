pub mod models;

use crate::middleware::auth;
use crate::state::AppState;

use axum::{middleware, Router};
use std::sync::Arc;
use utoipa::OpenApi;

/// Routes nested under `/admin` (model catalog maintenance).
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(models::router())
        .route_layer(middleware::from_fn_with_state(state, auth::admin_auth))
}

#[derive(OpenApi)]
#[openapi()]
pub struct AdminApi;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = AdminApi::openapi();
    spec.merge(models::AdminModelsApi::openapi());
    spec
}
