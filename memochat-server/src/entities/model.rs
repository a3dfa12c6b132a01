use std::future::Future;

use chrono::Utc;

use crate::entities::dao::{AiModel, ModelPricing};
use crate::entities::{decode_string_list, encode_string_list, parse_rfc3339_or_now, SqliteStore};

/// Optional filters for [`ModelStore::list_active_models`].
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub is_free: Option<bool>,
    pub provider: Option<String>,
    pub limit: i64,
}

pub trait ModelStore: Send + Sync + 'static {
    /// An active catalog entry; inactive rows read as absent.
    fn get_active_model(&self, id: &str) -> impl Future<Output = Result<Option<AiModel>, sqlx::Error>> + Send;
    fn list_active_models(&self, filter: ModelFilter) -> impl Future<Output = Result<Vec<AiModel>, sqlx::Error>> + Send;
    /// Insert or fully replace a catalog entry, keeping the original `created_at`.
    fn upsert_model(&self, model: AiModel) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Soft delete.  Returns `false` when no row matched.
    fn deactivate_model(&self, id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

const MODEL_COLUMNS: &str = "id, name, provider, description, pricing, features, is_free, \
                             max_tokens, context_length, is_active, created_at, updated_at";

type ModelRow = (String, String, String, String, String, String, bool, i64, i64, bool, String, String);

fn model_from_row(row: ModelRow) -> AiModel {
    let (id, name, provider, description, pricing, features, is_free, max_tokens, context_length, is_active, created_at, updated_at) = row;
    let pricing: ModelPricing = serde_json::from_str(&pricing).unwrap_or_else(|e| {
        tracing::warn!(model_id = %id, error = %e, "failed to decode model pricing; using defaults");
        ModelPricing::default()
    });
    AiModel {
        pricing,
        features: decode_string_list(&features, "ai_models.features"),
        created_at: parse_rfc3339_or_now(created_at, "ai_models.created_at"),
        updated_at: parse_rfc3339_or_now(updated_at, "ai_models.updated_at"),
        id,
        name,
        provider,
        description,
        is_free,
        max_tokens,
        context_length,
        is_active,
    }
}

impl ModelStore for SqliteStore {
    async fn get_active_model(&self, id: &str) -> Result<Option<AiModel>, sqlx::Error> {
        let row: Option<ModelRow> = sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM ai_models WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(model_from_row))
    }

    async fn list_active_models(&self, filter: ModelFilter) -> Result<Vec<AiModel>, sqlx::Error> {
        // NULL filters match everything.
        let rows: Vec<ModelRow> = sqlx::query_as(&format!(
            "SELECT {MODEL_COLUMNS} FROM ai_models \
             WHERE is_active = 1 \
               AND (?1 IS NULL OR is_free = ?1) \
               AND (?2 IS NULL OR provider = ?2) \
             ORDER BY name ASC, id ASC \
             LIMIT ?3"
        ))
        .bind(filter.is_free)
        .bind(filter.provider)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(model_from_row).collect())
    }

    async fn upsert_model(&self, model: AiModel) -> Result<(), sqlx::Error> {
        let pricing = serde_json::to_string(&model.pricing).unwrap_or_else(|_| "{}".to_owned());
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO ai_models \
             (id, name, provider, description, pricing, features, is_free, max_tokens, context_length, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11) \
             ON CONFLICT(id) DO UPDATE SET \
                 name = ?2, provider = ?3, description = ?4, pricing = ?5, features = ?6, \
                 is_free = ?7, max_tokens = ?8, context_length = ?9, is_active = ?10, updated_at = ?11",
        )
        .bind(&model.id)
        .bind(&model.name)
        .bind(&model.provider)
        .bind(&model.description)
        .bind(&pricing)
        .bind(encode_string_list(&model.features))
        .bind(model.is_free)
        .bind(model.max_tokens)
        .bind(model.context_length)
        .bind(model.is_active)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn deactivate_model(&self, id: &str) -> Result<bool, sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE ai_models SET is_active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(&updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
