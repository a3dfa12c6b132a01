//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

/// Runtime configuration for memochat-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.  Without `OPENROUTER_API_KEY` the
/// chat endpoints still answer, but always with the fallback reply.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// SQLite database URL (default: `"sqlite://memochat.db"`).
    /// The file is created on first start.
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Directory for daily-rolling log files.  `None` logs to stdout only.
    pub log_dir: Option<String>,

    /// Comma-separated CORS origin allow-list.  `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,

    /// Header carrying the authenticated caller id, set by the identity proxy.
    pub user_header: String,

    /// Shared bearer token required on `/v1` routes when set.
    pub api_token: Option<String>,

    /// Bearer token required on `/admin` routes when set.
    pub admin_token: Option<String>,

    /// Upstream completion service settings.
    pub upstream: UpstreamConfig,
}

/// Settings for the OpenRouter-compatible completion API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    /// Bearer credential.  `None` makes every call fail fast into the fallback.
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` for attribution on the aggregator side.
    pub app_url: String,
    /// Sent as `X-Title`.
    pub app_title: String,
    pub connect_timeout: Duration,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("MEMOCHAT_BIND", "0.0.0.0:3000"),
            database_url: env_or("MEMOCHAT_DATABASE_URL", "sqlite://memochat.db"),
            log_level: env_or("MEMOCHAT_LOG", "info"),
            log_json: env_flag("MEMOCHAT_LOG_JSON", false),
            log_dir: env_opt("MEMOCHAT_LOG_DIR"),
            cors_allowed_origins: env_opt("MEMOCHAT_CORS_ORIGINS"),
            enable_swagger: env_flag("MEMOCHAT_ENABLE_SWAGGER", true),
            user_header: env_or("MEMOCHAT_USER_HEADER", "x-user-id").to_ascii_lowercase(),
            api_token: env_opt("MEMOCHAT_API_TOKEN"),
            admin_token: env_opt("MEMOCHAT_ADMIN_TOKEN"),
            upstream: UpstreamConfig {
                base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
                api_key: env_opt("OPENROUTER_API_KEY"),
                app_url: env_or("MEMOCHAT_APP_URL", "http://localhost:3000"),
                app_title: env_or("MEMOCHAT_APP_TITLE", "AI Memo Chat"),
                connect_timeout: Duration::from_secs(parse_env(
                    "MEMOCHAT_UPSTREAM_CONNECT_TIMEOUT_SECS",
                    10,
                )),
            },
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Unset and blank values both read as `None`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl Config {
    /// Test configuration pointing the upstream client at `base_url`.
    pub fn for_tests(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            bind_address: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            cors_allowed_origins: None,
            enable_swagger: false,
            user_header: "x-user-id".into(),
            api_token: None,
            admin_token: None,
            upstream: UpstreamConfig {
                base_url: base_url.to_owned(),
                api_key: api_key.map(str::to_owned),
                app_url: "http://localhost:3000".into(),
                app_title: "AI Memo Chat".into(),
                connect_timeout: Duration::from_secs(2),
            },
        }
    }
}
