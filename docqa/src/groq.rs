//! Groq completion provider using the OpenAI-compatible chat completions API.
//!
//! This module is only available when the `groq` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::Completer;
use crate::error::{QaError, Result};

/// The default Groq OpenAI-compatible API base URL.
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// The default chat model.
const DEFAULT_MODEL: &str = "llama3-70b-8192";

const PROVIDER: &str = "Groq";

/// A [`Completer`] backed by Groq's chat completions endpoint.
///
/// The prompt is sent as a single user message and the first choice's
/// content is returned.
///
/// # Configuration
///
/// - `model` – defaults to `llama3-70b-8192`.
/// - `temperature` – defaults to `0.0`.
/// - `api_key` – from the constructor or the `GROQ_API_KEY` environment variable.
/// - `timeout` – per-request timeout, defaults to 60 seconds.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::groq::GroqCompleter;
///
/// let completer = GroqCompleter::from_env()?.with_temperature(0.0);
/// let answer = completer.complete("Say hello").await?;
/// ```
pub struct GroqCompleter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

impl GroqCompleter {
    /// Create a new completer with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(QaError::Config("Groq API key must not be empty".into()));
        }

        Ok(Self {
            client: build_client(Duration::from_secs(60))?,
            api_key,
            model: DEFAULT_MODEL.into(),
            temperature: 0.0,
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    /// Create a new completer using the `GROQ_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| QaError::Config("GROQ_API_KEY environment variable not set".into()))?;
        Self::new(api_key)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Override the API base URL (any OpenAI-compatible endpoint).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QaError::Config(format!("failed to build HTTP client: {e}")))
}

// ── Chat completions request/response types ────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Completer implementation ───────────────────────────────────────

#[async_trait]
impl Completer for GroqCompleter {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "completing");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                QaError::completion(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(QaError::completion(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            QaError::completion(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| QaError::completion(PROVIDER, "API returned no completion"))
    }
}
