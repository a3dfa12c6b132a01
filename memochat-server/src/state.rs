//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::services::openrouter::OpenRouterClient;

/// State shared across all HTTP handlers and relay tasks.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Sessions, messages, memos, model catalog and preferences.
    pub store: Arc<SqliteStore>,
    /// Upstream completion client; cheap to clone, pools connections.
    pub upstream: Arc<OpenRouterClient>,
}
