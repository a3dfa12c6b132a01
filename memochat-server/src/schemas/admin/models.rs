use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::schemas::v1::models::PricingResponse;

/// Body of `POST /admin/models`.  Replaces any existing entry with the same id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterModelRequest {
    /// Upstream model id, e.g. `"anthropic/claude-sonnet-4"`.
    #[validate(custom(function = "crate::extract::not_blank", message = "id is required"))]
    pub id: String,
    #[validate(custom(function = "crate::extract::not_blank", message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "crate::extract::not_blank", message = "provider is required"))]
    pub provider: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pricing: PricingResponse,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_free: bool,
    #[validate(range(min = 1, message = "max_tokens must be positive"))]
    pub max_tokens: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub context_length: i64,
}
