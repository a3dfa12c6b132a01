use std::future::Future;

use chrono::Utc;

use crate::entities::dao::UserPreference;
use crate::entities::{parse_rfc3339_or_now, SqliteStore};

pub trait PreferenceStore: Send + Sync + 'static {
    fn get_preference(&self, user_id: &str) -> impl Future<Output = Result<Option<UserPreference>, sqlx::Error>> + Send;
    /// Upsert the caller's default model and return the stored row.
    fn set_default_model(
        &self,
        user_id: &str,
        model_id: &str,
    ) -> impl Future<Output = Result<UserPreference, sqlx::Error>> + Send;
}

impl PreferenceStore for SqliteStore {
    async fn get_preference(&self, user_id: &str) -> Result<Option<UserPreference>, sqlx::Error> {
        let row: Option<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT user_id, default_model_id, updated_at FROM user_preferences WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(user_id, default_model_id, updated_at)| UserPreference {
            user_id,
            default_model_id,
            updated_at: parse_rfc3339_or_now(updated_at, "user_preferences.updated_at"),
        }))
    }

    async fn set_default_model(&self, user_id: &str, model_id: &str) -> Result<UserPreference, sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO user_preferences (user_id, default_model_id, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET default_model_id = ?2, updated_at = ?3",
        )
        .bind(user_id)
        .bind(model_id)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(UserPreference {
            user_id: user_id.to_owned(),
            default_model_id: Some(model_id.to_owned()),
            updated_at: now,
        })
    }
}
