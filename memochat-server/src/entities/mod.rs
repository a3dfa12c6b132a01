//! Database abstraction layer.
//!
//! Each concern has its own store trait ([`SessionStore`], [`ChatStore`],
//! [`MemoStore`], [`ModelStore`], [`PreferenceStore`]) implemented by
//! [`SqliteStore`].  Handlers depend on the traits, so another backend only
//! needs new impls and a different concrete type in [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures (stable since Rust
//! 1.75) so no extra `async-trait` crate is required.
//!
//! Every query touching sessions or memos filters by the owning `user_id`.

pub mod chat;
pub mod dao;
pub mod memo;
pub mod model;
pub mod preference;
pub mod session;

pub use dao::{AiModel, ChatMessage, ChatSession, Memo, MessageRole, ModelPricing, SessionWithModel, UserPreference};

pub use chat::ChatStore;
pub use memo::MemoStore;
pub use model::{ModelFilter, ModelStore};
pub use preference::PreferenceStore;
pub use session::SessionStore;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// SQLite-backed store for every persisted entity.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://memochat.db"`
    /// or `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `:memory:` opens a distinct database, so an
        // in-memory store is pinned to a single connection that never expires.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ── row decoding helpers ─────────────────────────────────────────────────────

pub(crate) fn parse_rfc3339_or_now(raw: String, field: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, error = %e, field, "failed to parse timestamp; using now");
        Utc::now()
    })
}

/// Decode a JSON-encoded string list column.  Corrupt values decode as empty.
pub(crate) fn decode_string_list(raw: &str, field: &'static str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(raw = %raw, error = %e, field, "failed to decode list column; using empty list");
        Vec::new()
    })
}

pub(crate) fn encode_string_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_owned())
}
