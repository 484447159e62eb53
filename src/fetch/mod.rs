//! URL fetching and visible-text extraction.
//!
//! One blocking GET per call: no retry, no backoff, no caching. Redirects
//! follow the HTTP client's default policy. Non-success statuses are not
//! treated as errors; whatever body comes back is extracted like any other
//! page.

pub mod config;
pub mod content;
pub mod error;

pub use config::FetchConfig;
pub use error::FetchError;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use scraper::Html;
use url::Url;

use crate::fetch::content::{extract_title, extract_visible_text};

/// Plain-text content extracted from a fetched page.
#[derive(Clone, Debug)]
pub struct PageContent {
    /// The URL as supplied by the user.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// Page title, empty when none was found.
    pub title: String,
    /// Concatenated visible text.
    pub text: String,
    /// Response content type.
    pub content_type: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Blocking page fetcher.
pub struct FetchService {
    client: Client,
    config: FetchConfig,
}

impl FetchService {
    /// Create a fetcher with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a fetcher with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetchConfig::default())
    }

    /// Fetch a URL and extract its visible text.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid, the request fails, the body
    /// exceeds the configured size limit, or the content type is neither
    /// HTML nor plain text.
    pub fn fetch_page(&self, url: &str) -> Result<PageContent, FetchError> {
        Url::parse(url)?;

        tracing::debug!(%url, "Fetching page");
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                self.config.random_user_agent(),
            )
            .send()?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_content_length
        {
            return Err(FetchError::ContentTooLarge(len));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let html = response.text()?;
        let document = Html::parse_document(&html);

        Ok(PageContent {
            url: url.to_string(),
            final_url,
            title: extract_title(&document),
            text: extract_visible_text(&document),
            content_type,
            fetched_at: Utc::now(),
        })
    }
}
