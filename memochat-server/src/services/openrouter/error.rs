use thiserror::Error;

/// Errors returned by the upstream completion client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No credential is configured, so the request is never sent.
    #[error("upstream API key is not configured")]
    MissingApiKey,

    /// Connection, TLS, timeout or body read failure.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
