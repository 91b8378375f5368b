//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a hosted embedding backend behind a unified async
/// interface and report failures as [`QaError::EmbeddingProvider`](crate::QaError::EmbeddingProvider).
/// The default [`embed_batch`](Embedder::embed_batch) implementation calls
/// [`embed`](Embedder::embed) sequentially; backends that support native
/// batching should override it.
///
/// The same embedder must be used to build an index and to query it.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::Embedder;
///
/// let embedder = MyEmbedder::new();
/// let vector = embedder.embed("hello world").await?;
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the provider, used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}
