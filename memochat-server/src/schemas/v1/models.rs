//! Request / response types for the model catalog (`/v1/models`, `/admin/models`).

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{AiModel, ModelPricing};

/// Query parameters for `GET /v1/models`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListModelsQuery {
    /// Only free (`true`) or only paid (`false`) models.
    pub is_free: Option<bool>,
    /// Exact provider match, e.g. `"openai"`.
    pub provider: Option<String>,
    /// Page size, clamped to 1..=50 (default 50).
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub estimated_cost: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelResponse {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub description: String,
    pub pricing: PricingResponse,
    pub features: Vec<String>,
    pub is_free: bool,
    pub max_tokens: i64,
    pub context_length: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelListResponse {
    pub models: Vec<ModelResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelEnvelope {
    pub model: ModelResponse,
}

impl From<ModelPricing> for PricingResponse {
    fn from(pricing: ModelPricing) -> Self {
        Self {
            input: pricing.input,
            output: pricing.output,
            estimated_cost: pricing.estimated_cost,
        }
    }
}

impl From<PricingResponse> for ModelPricing {
    fn from(pricing: PricingResponse) -> Self {
        Self {
            input: pricing.input,
            output: pricing.output,
            estimated_cost: pricing.estimated_cost,
        }
    }
}

impl AiModel {
    pub fn to_response(&self) -> ModelResponse {
        ModelResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            provider: self.provider.clone(),
            description: self.description.clone(),
            pricing: self.pricing.clone().into(),
            features: self.features.clone(),
            is_free: self.is_free,
            max_tokens: self.max_tokens,
            context_length: self.context_length,
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}
