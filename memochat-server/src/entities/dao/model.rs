use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pricing blob stored as JSON in `ai_models.pricing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub estimated_cost: String,
}

/// A model entry in the `ai_models` catalog.
#[derive(Debug, Clone)]
pub struct AiModel {
    /// Upstream model id, e.g. `"openai/gpt-4.1"`.
    pub id: String,
    /// Display name shown to users and embedded in the fallback reply.
    pub name: String,
    pub provider: String,
    pub description: String,
    pub pricing: ModelPricing,
    pub features: Vec<String>,
    pub is_free: bool,
    /// Completion token ceiling advertised for the model.
    pub max_tokens: i64,
    pub context_length: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
