use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::{ModelStore, PreferenceStore};
use crate::error::ServerError;
use crate::extract::{CurrentUser, ValidatedJson};
use crate::schemas::v1::preferences::{PreferencesResponse, UpdatePreferencesRequest};
use crate::services::chat::ChatError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(get_preferences, update_preferences),
    components(schemas(PreferencesResponse, UpdatePreferencesRequest))
)]
pub struct PreferencesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/user/preferences", get(get_preferences).put(update_preferences))
}

#[utoipa::path(
    get,
    path = "/v1/user/preferences",
    tag = "preferences",
    responses(
        (status = 200, description = "Caller's preferences; defaultModelId is null until set", body = PreferencesResponse),
    )
)]
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<PreferencesResponse>, ServerError> {
    let preference = state.store.get_preference(&user.id).await?;
    Ok(Json(PreferencesResponse {
        default_model_id: preference.and_then(|p| p.default_model_id),
    }))
}

#[utoipa::path(
    put,
    path = "/v1/user/preferences",
    tag = "preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences stored", body = PreferencesResponse),
        (status = 400, description = "Unknown or inactive model"),
    )
)]
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesResponse>, ServerError> {
    if state.store.get_active_model(&req.default_model_id).await?.is_none() {
        return Err(ChatError::ModelNotFound(req.default_model_id).into());
    }
    let stored = state.store.set_default_model(&user.id, &req.default_model_id).await?;
    tracing::debug!(user_id = %user.id, model_id = ?stored.default_model_id, "default model updated");
    Ok(Json(PreferencesResponse {
        default_model_id: stored.default_model_id,
    }))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes;
    use crate::testing;

    #[tokio::test]
    async fn default_model_is_null_until_set() {
        let state = testing::app_state("http://127.0.0.1:9", None).await;
        testing::seed_model(&state.store, "openai/gpt-4.1", "GPT-4.1", "openai", 8000).await;
        let app = routes::build(state);

        let before = testing::send(&app, testing::request("GET", "/v1/user/preferences", Some("alice"), None)).await;
        assert_eq!(before.json(), json!({ "defaultModelId": null }));

        let body = json!({ "defaultModelId": "openai/gpt-4.1" });
        let put = testing::send(&app, testing::request("PUT", "/v1/user/preferences", Some("alice"), Some(&body))).await;
        assert_eq!(put.status, StatusCode::OK);

        let after = testing::send(&app, testing::request("GET", "/v1/user/preferences", Some("alice"), None)).await;
        assert_eq!(after.json()["defaultModelId"], "openai/gpt-4.1");
        let other = testing::send(&app, testing::request("GET", "/v1/user/preferences", Some("bob"), None)).await;
        assert_eq!(other.json()["defaultModelId"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn unknown_default_model_is_rejected() {
        let state = testing::app_state("http://127.0.0.1:9", None).await;
        let app = routes::build(state);

        let body = json!({ "defaultModelId": "ghost/model" });
        let put = testing::send(&app, testing::request("PUT", "/v1/user/preferences", Some("alice"), Some(&body))).await;
        assert_eq!(put.status, StatusCode::BAD_REQUEST);
        assert_eq!(put.json()["kind"], "model_not_found");
    }
}
