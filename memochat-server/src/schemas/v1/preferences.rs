use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub default_model_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    /// Must name an active catalog model.
    #[validate(custom(function = "crate::extract::not_blank", message = "defaultModelId is required"))]
    pub default_model_id: String,
}
