//! Similarity ranking of taxonomy categories against a document.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use advisory_embeddings::{cosine_similarity, ChunkedEmbedder, EmbeddingProvider};

use crate::category::{Category, CategoryEmbedding};
use crate::error::Result;

/// Default number of candidates returned by the ranker.
pub const DEFAULT_TOP_K: usize = 5;

/// A category ranked against a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCategory {
    /// The matched category.
    pub category: Category,

    /// Cosine similarity to the document embedding.
    pub score: f32,
}

/// Ranks taxonomy categories against a document by cosine similarity.
///
/// This is the cheap pre-filter stage: it narrows the full taxonomy to
/// a shortlist the refinement stage can afford to reason over.
pub struct SimilarityRanker {
    /// Chunk size for long-document embedding.
    chunk_token_size: usize,
}

impl SimilarityRanker {
    /// Create a ranker with the given chunk size for long documents.
    pub fn new(chunk_token_size: usize) -> Self {
        Self { chunk_token_size }
    }

    /// Rank every category embedding against the document and return
    /// the `top_k` best matches, highest similarity first.
    ///
    /// The sort is stable: equal scores keep the taxonomy's resource
    /// order. An empty `category_embeddings` slice yields an empty
    /// list — no taxonomy available is a valid degenerate case, not an
    /// error — and no embedding call is made.
    pub async fn rank<P>(
        &self,
        embedder: &ChunkedEmbedder<P>,
        document_text: &str,
        category_embeddings: &[CategoryEmbedding],
        top_k: usize,
    ) -> Result<Vec<RankedCategory>>
    where
        P: EmbeddingProvider,
    {
        if category_embeddings.is_empty() {
            return Ok(Vec::new());
        }

        let document_embedding = embedder
            .embed_long(document_text, self.chunk_token_size)
            .await?;

        let mut ranked = Vec::with_capacity(category_embeddings.len());
        for entry in category_embeddings {
            let score = cosine_similarity(&document_embedding, &entry.embedding)?;
            ranked.push(RankedCategory {
                category: entry.category.clone(),
                score,
            });
        }

        // Stable sort keeps resource order for equal scores.
        ranked.sort_by(|a, b| OrderedFloat(b.score).cmp(&OrderedFloat(a.score)));
        ranked.truncate(top_k);

        debug!(
            "Ranked {} categories, returning top {}: {:?}",
            category_embeddings.len(),
            ranked.len(),
            ranked
                .iter()
                .map(|r| r.category.id.as_str())
                .collect::<Vec<_>>()
        );

        Ok(ranked)
    }
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(advisory_embeddings::chunked::DEFAULT_CHUNK_TOKEN_SIZE)
    }
}
