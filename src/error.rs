//! Error types for the market data layer

use thiserror::Error;

/// Fatal configuration errors, raised once at load time
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required settings are missing or inconsistent.
    /// Every problem found during validation is collected before failing.
    #[error("invalid market API configuration:\n{}", problems.join("\n"))]
    Invalid { problems: Vec<String> },
}

/// Errors that can occur when fetching records from a source adapter
///
/// Adapters do not retry and do not catch normalization errors; the
/// orchestrator owns the fallback chain.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network request failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the provider
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimited,

    /// Source is disabled in configuration
    #[error("source {0} is disabled")]
    Disabled(&'static str),

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Per-record normalization failures
///
/// A single malformed record is dropped and the batch continues.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Record is missing a required field
    #[error("record missing field: {0}")]
    MissingField(&'static str),

    /// Price field present but unparseable or negative
    #[error("unparseable price: {0:?}")]
    BadPrice(String),
}
