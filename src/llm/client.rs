//! Blocking HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! Behaviour:
//! - Single `POST {base}/chat/completions` per call, no retry, no backoff.
//! - The per-session credential is passed on every call; the client itself
//!   holds no secret.
//! - The first choice's message text is returned verbatim.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::chat::turn::Turn;

/// Model identifier used when `SUMCHAT_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// API base used when `SUMCHAT_API_BASE` is not set.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Environment variable for a custom endpoint base URL.
const API_BASE_ENV: &str = "SUMCHAT_API_BASE";

/// Environment variable for a custom model identifier.
const MODEL_ENV: &str = "SUMCHAT_MODEL";

/// Connection timeout for the completion endpoint.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout for long generations.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors produced by the completion endpoint client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential has been supplied for the session.
    #[error("api credential is not set")]
    MissingCredential,

    /// Transport-level failure (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status (auth, quota, ...).
    #[error("completion endpoint returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for display.
        body: String,
    },

    /// The endpoint answered 2xx but carried no generated text.
    #[error("completion endpoint returned no generated text")]
    EmptyCompletion,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<OutgoingMessage<'a>>,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: IncomingMessage,
}

#[derive(Deserialize)]
struct IncomingMessage {
    content: Option<String>,
}

/// Maximum error-body length kept for display.
const ERROR_BODY_LIMIT: usize = 600;

/// Blocking client for chat completions.
pub struct CompletionClient {
    client: Client,
    base_url: String,
    model: String,
}

impl CompletionClient {
    /// Create a client for the given endpoint base and model.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(CLIENT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    /// Create a client configured from `SUMCHAT_API_BASE` / `SUMCHAT_MODEL`,
    /// falling back to the stock endpoint and model.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url =
            std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(base_url, model)
    }

    /// The model identifier sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Submit an ordered message list and return the generated text.
    ///
    /// # Errors
    /// Returns an error if the credential is empty, the request fails, the
    /// endpoint answers a non-success status, or the response carries no
    /// generated text.
    pub fn chat(&self, api_key: &str, context: &[Turn]) -> Result<String, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::MissingCredential);
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: build_messages(context),
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, turns = context.len(), "Submitting completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_for_display(&body),
            });
        }

        let parsed: ChatCompletionResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ApiError::EmptyCompletion)
    }
}

/// Map turns to the endpoint's message shape.
fn build_messages(context: &[Turn]) -> Vec<OutgoingMessage<'_>> {
    context
        .iter()
        .map(|turn| OutgoingMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        })
        .collect()
}

/// Truncate an error body to a displayable length.
fn truncate_for_display(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
