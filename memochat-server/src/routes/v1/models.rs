use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::{ModelFilter, ModelStore};
use crate::error::ServerError;
use crate::schemas::v1::models::{ListModelsQuery, ModelEnvelope, ModelListResponse, ModelResponse, PricingResponse};
use crate::state::AppState;

const MAX_MODELS: i64 = 50;

#[derive(OpenApi)]
#[openapi(
    paths(list_models, get_model),
    components(schemas(ModelResponse, ModelListResponse, ModelEnvelope, PricingResponse))
)]
pub struct ModelsApi;

/// Register model catalog routes.  Ids contain `/`, hence the wildcard.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", get(list_models))
        .route("/models/{*id}", get(get_model))
}

#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "models",
    params(ListModelsQuery),
    responses(
        (status = 200, description = "Active models ordered by name", body = ModelListResponse),
    )
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListModelsQuery>,
) -> Result<Json<ModelListResponse>, ServerError> {
    let filter = ModelFilter {
        is_free: query.is_free,
        provider: query.provider.filter(|p| !p.trim().is_empty()),
        limit: query.limit.unwrap_or(MAX_MODELS).clamp(1, MAX_MODELS),
    };
    let models = state.store.list_active_models(filter).await?;
    Ok(Json(ModelListResponse {
        models: models.iter().map(|m| m.to_response()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/models/{id}",
    tag = "models",
    params(("id" = String, Path, description = "Model id, e.g. openai/gpt-4.1")),
    responses(
        (status = 200, description = "Model detail", body = ModelEnvelope),
        (status = 404, description = "Unknown or inactive model"),
    )
)]
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ModelEnvelope>, ServerError> {
    let model = state
        .store
        .get_active_model(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("model {id} not found")))?;
    Ok(Json(ModelEnvelope {
        model: model.to_response(),
    }))
}
