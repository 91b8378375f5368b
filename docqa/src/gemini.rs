//! Gemini embedding provider using the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::Embedder;
use crate::error::{QaError, Result};

/// The default Generative Language API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "models/embedding-001";

/// Maximum number of texts per `batchEmbedContents` request.
const MAX_BATCH_SIZE: usize = 100;

const PROVIDER: &str = "Gemini";

/// An [`Embedder`] backed by the Gemini embedding API.
///
/// Section texts are embedded with the `RETRIEVAL_DOCUMENT` task type and
/// queries with `RETRIEVAL_QUERY`, so both land in the same retrieval space.
///
/// # Configuration
///
/// - `model` – defaults to `models/embedding-001`.
/// - `api_key` – from the constructor or the `GOOGLE_API_KEY` environment variable.
/// - `timeout` – per-request timeout, defaults to 60 seconds.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::gemini::GeminiEmbedder;
///
/// let embedder = GeminiEmbedder::from_env()?;
/// let vector = embedder.embed("hello world").await?;
/// ```
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiEmbedder {
    /// Create a new embedder with the given API key and the default model.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(QaError::Config("Gemini API key must not be empty".into()));
        }

        Ok(Self {
            client: build_client(Duration::from_secs(60))?,
            api_key,
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    /// Create a new embedder using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| {
            QaError::Config("GOOGLE_API_KEY environment variable not set".into())
        })?;
        Self::new(api_key)
    }

    /// Set the model name. A missing `models/` prefix is added.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model =
            if model.starts_with("models/") { model } else { format!("models/{model}") };
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn content_request<'a>(&'a self, text: &'a str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: Content { parts: vec![Part { text }] },
            task_type,
        }
    }

    async fn post<Req: Serialize, Res: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Res> {
        let url = format!("{}/{}:{method}", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                QaError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(QaError::embedding(PROVIDER, format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            QaError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QaError::Config(format!("failed to build HTTP client: {e}")))
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embedder implementation ────────────────────────────────────────

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding query");

        let request = self.content_request(text, TaskType::RetrievalQuery);
        let response: EmbedContentResponse = self.post("embedContent", &request).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let request = BatchEmbedContentsRequest {
                requests: batch
                    .iter()
                    .map(|text| self.content_request(text, TaskType::RetrievalDocument))
                    .collect(),
            };
            let response: BatchEmbedContentsResponse =
                self.post("batchEmbedContents", &request).await?;

            if response.embeddings.len() != batch.len() {
                error!(provider = PROVIDER, "embedding count mismatch");
                return Err(QaError::embedding(
                    PROVIDER,
                    format!(
                        "expected {} embeddings, received {}",
                        batch.len(),
                        response.embeddings.len()
                    ),
                ));
            }
            results.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(GeminiEmbedder::new(""), Err(QaError::Config(_))));
    }

    #[test]
    fn model_gets_prefixed() {
        let embedder = GeminiEmbedder::new("key").unwrap().with_model("text-embedding-004");
        assert_eq!(embedder.model(), "models/text-embedding-004");
        let embedder = embedder.with_model("models/embedding-001");
        assert_eq!(embedder.model(), "models/embedding-001");
    }

    #[test]
    fn request_uses_camel_case_task_type() {
        let embedder = GeminiEmbedder::new("key").unwrap();
        let request = embedder.content_request("hi", TaskType::RetrievalQuery);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["model"], "models/embedding-001");
        assert_eq!(json["content"]["parts"][0]["text"], "hi");
    }

    #[tokio::test]
    #[ignore = "requires GOOGLE_API_KEY and network access"]
    async fn embeds_against_live_api() {
        let embedder = GeminiEmbedder::from_env().unwrap();
        let vectors = embedder.embed_batch(&["alpha", "beta"]).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(!vectors[0].is_empty());
    }
}
