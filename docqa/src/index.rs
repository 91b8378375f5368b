//! In-memory knowledge index using cosine similarity.
//!
//! A [`KnowledgeIndex`] holds one [`IndexedVector`] per section of a single
//! document. It is built all-or-nothing from an [`Embedder`] and never changes
//! afterwards; replacing the document means building a new index.


use tracing::{error, info};

use crate::document::{IndexedVector, SearchResult, Section};
use crate::embedding::Embedder;
use crate::error::{QaError, Result};

/// An immutable, flat nearest-neighbour index over one document's sections.
///
/// # Example
///
/// ```rust,ignore
/// use docqa::{KnowledgeIndex, sectioner};
///
/// let sections = sectioner::split(&text, sectioner::DEFAULT_DELIMITER);
/// let index = KnowledgeIndex::build(sections, &embedder).await?;
/// let results = index.search(&query_vector, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct KnowledgeIndex {
    vectors: Vec<IndexedVector>,
}

impl KnowledgeIndex {
    /// Embed every section and collect the results into a fresh index.
    ///
    /// Sections are embedded in one batch call. Building from zero sections
    /// yields an empty index without contacting the provider.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::EmbeddingProvider`] if the provider fails or returns
    /// the wrong number of vectors. No partial index is produced.
    pub async fn build(sections: Vec<Section>, embedder: &dyn Embedder) -> Result<Self> {
        if sections.is_empty() {
            info!(section_count = 0, "built knowledge index (empty)");
            return Ok(Self::default());
        }

        let texts: Vec<&str> = sections.iter().map(|s| s.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| {
            error!(provider = embedder.name(), error = %e, "embedding failed during index build");
            e
        })?;

        if embeddings.len() != sections.len() {
            error!(
                provider = embedder.name(),
                expected = sections.len(),
                received = embeddings.len(),
                "embedding count mismatch"
            );
            return Err(QaError::embedding(
                embedder.name(),
                format!("expected {} embeddings, received {}", sections.len(), embeddings.len()),
            ));
        }

        let vectors: Vec<IndexedVector> = sections
            .into_iter()
            .zip(embeddings)
            .map(|(section, embedding)| IndexedVector {
                id: format!("section-{}", section.index),
                section,
                embedding,
            })
            .collect();

        info!(section_count = vectors.len(), "built knowledge index");
        Ok(Self { vectors })
    }

    /// Number of indexed sections.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no sections.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The indexed vectors in insertion order.
    pub fn vectors(&self) -> &[IndexedVector] {
        &self.vectors
    }

    /// Return the `top_k` sections most similar to `embedding`.
    ///
    /// Results are ordered by descending score. Sections with equal scores
    /// keep their insertion order.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .vectors
            .iter()
            .map(|vector| SearchResult {
                section: vector.section.clone(),
                score: cosine_similarity(&vector.embedding, embedding),
            })
            .collect();

        // `sort_by` is stable, which keeps ties in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude. A score that is not a
/// number, e.g. from a norm overflowing to infinity, ranks last. Negative
/// zero is returned as 0.0 so the two tie under a total order.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_nan() {
        f32::NEG_INFINITY
    } else if score == 0.0 {
        0.0
    } else {
        score
    }
}
