//! Model catalog maintenance.  Chat routes only accept active catalog entries,
//! so these endpoints decide which models users can pick.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::entities::{AiModel, ModelStore};
use crate::error::ServerError;
use crate::extract::ValidatedJson;
use crate::schemas::admin::models::RegisterModelRequest;
use crate::schemas::v1::models::ModelEnvelope;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(register_model, deactivate_model),
    components(schemas(RegisterModelRequest))
)]
pub struct AdminModelsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", post(register_model))
        .route("/models/{*id}", delete(deactivate_model))
}

#[utoipa::path(
    post,
    path = "/admin/models",
    tag = "admin",
    request_body = RegisterModelRequest,
    responses(
        (status = 200, description = "Model registered and active", body = ModelEnvelope),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid admin token"),
    )
)]
pub async fn register_model(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterModelRequest>,
) -> Result<Json<ModelEnvelope>, ServerError> {
    let now = Utc::now();
    let model = AiModel {
        id: req.id.trim().to_owned(),
        name: req.name,
        provider: req.provider,
        description: req.description,
        pricing: req.pricing.into(),
        features: req.features,
        is_free: req.is_free,
        max_tokens: req.max_tokens,
        context_length: req.context_length,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.store.upsert_model(model.clone()).await?;
    tracing::info!(model_id = %model.id, provider = %model.provider, "model registered");

    // Re-read so `created_at` reflects the original registration on replace.
    let stored = state
        .store
        .get_active_model(&model.id)
        .await?
        .ok_or_else(|| ServerError::Internal(format!("model {} vanished after upsert", model.id)))?;
    Ok(Json(ModelEnvelope {
        model: stored.to_response(),
    }))
}

#[utoipa::path(
    delete,
    path = "/admin/models/{id}",
    tag = "admin",
    params(("id" = String, Path, description = "Model id")),
    responses(
        (status = 200, description = "Model deactivated", body = serde_json::Value),
        (status = 404, description = "Unknown model"),
    )
)]
pub async fn deactivate_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    if !state.store.deactivate_model(&id).await? {
        return Err(ServerError::NotFound(format!("model {id} not found")));
    }
    tracing::info!(model_id = %id, "model deactivated");
    Ok(Json(serde_json::json!({ "deleted": true })))
}
