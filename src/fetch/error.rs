//! Error types for the fetch module.

use thiserror::Error;

/// Errors that can occur while fetching and extracting a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body larger than the configured limit.
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(u64),

    /// Content type is neither HTML nor plain text.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}
