//! OpenAI chat-completions client.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the completion API.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key configured
    #[error("Missing OPENAI_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
}

/// Message role in a completion request.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions to the model
    System,
    /// End-user content
    User,
}

/// One message in a completion request.
#[derive(Clone, Debug, Serialize)]
pub struct CompletionMessage {
    /// Who is speaking
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

/// A completion request; the client supplies the model.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    /// Conversation so far
    pub messages: Vec<CompletionMessage>,
    /// Completion token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

/// OpenAI API client
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl CompletionClient {
    /// Create a new client with an explicit API key and model.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: "https://api.openai.com/v1".to_string(),
            model,
        }
    }

    /// Create a new client with API key from environment.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::MissingApiKey` if `OPENAI_API_KEY` is not set.
    pub fn from_env(model: String) -> Result<Self, CompletionError> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| CompletionError::MissingApiKey)?;
        Ok(Self::new(api_key, model))
    }

    /// Point the client at a different base URL (test servers).
    #[must_use]
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    /// Run a completion and return the first choice's text.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures.
    pub async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let parsed = response
                    .json::<WireResponse>()
                    .await
                    .map_err(|e| CompletionError::ResponseParseFailed(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message.content)
                    .ok_or_else(|| {
                        CompletionError::ResponseParseFailed("empty choices".to_string())
                    })
            }
            StatusCode::TOO_MANY_REQUESTS => Err(CompletionError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(CompletionError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CompletionError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}
