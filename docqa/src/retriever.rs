//! Query-time retrieval against a [`KnowledgeIndex`].

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{SearchResult, Section};
use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::index::KnowledgeIndex;

/// Embeds queries and looks them up in a [`KnowledgeIndex`].
///
/// Holds the same [`Embedder`] that built the index; the query and section
/// vectors must come from one embedding space.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Create a retriever over the given embedder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Return a reference to the embedder.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Return at most `k` sections most similar to `query`, most similar first.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::EmptyIndex`] if the index has no sections, and
    /// [`QaError::EmbeddingProvider`] if embedding the query fails.
    pub async fn retrieve(
        &self,
        index: &KnowledgeIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<Section>> {
        let results = self.search(index, query, k).await?;
        Ok(results.into_iter().map(|r| r.section).collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps the similarity scores.
    pub async fn search(
        &self,
        index: &KnowledgeIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            return Err(QaError::EmptyIndex);
        }

        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(provider = self.embedder.name(), error = %e, "embedding failed during query");
            e
        })?;

        let results = index.search(&query_embedding, k);
        debug!(
            result_count = results.len(),
            top_score = results.first().map(|r| r.score),
            "retrieved sections"
        );
        Ok(results)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever").field("embedder", &self.embedder.name()).finish()
    }
}
