use chrono::{DateTime, Utc};

/// A row in the `user_preferences` table.
#[derive(Debug, Clone)]
pub struct UserPreference {
    pub user_id: String,
    pub default_model_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}
