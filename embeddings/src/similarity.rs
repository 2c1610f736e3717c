//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};
use crate::Embedding;

/// Denominator guard against zero-norm vectors.
const NORM_EPSILON: f32 = 1e-8;

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical vectors
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// The denominator carries a small epsilon so a zero-norm vector yields
/// a near-zero score instead of NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    Ok(dot_product / (magnitude_a * magnitude_b + NORM_EPSILON))
}

/// A similarity search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// ID of the matched item.
    pub id: String,

    /// Similarity score.
    pub score: f32,

    /// Additional metadata.
    pub metadata: Option<serde_json::Value>,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            metadata: None,
        }
    }

    /// Add metadata to the result.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Find the top-k most similar embeddings.
///
/// The sort is stable: candidates with equal scores keep their input
/// order.
pub fn find_top_k(
    query: &Embedding,
    candidates: &[(String, Embedding)],
    k: usize,
) -> Result<Vec<SimilarityResult>> {
    let mut scores: Vec<(OrderedFloat<f32>, String)> = Vec::with_capacity(candidates.len());

    for (id, embedding) in candidates {
        let score = cosine_similarity(query, embedding)?;
        scores.push((OrderedFloat(score), id.clone()));
    }

    // Stable sort by score descending
    scores.sort_by(|a, b| b.0.cmp(&a.0));

    let results: Vec<SimilarityResult> = scores
        .into_iter()
        .take(k)
        .map(|(score, id)| SimilarityResult::new(id, score.0))
        .collect();

    Ok(results)
}

/// Compute the elementwise mean of multiple embeddings.
pub fn mean(embeddings: &[Embedding]) -> Result<Embedding> {
    if embeddings.is_empty() {
        return Err(EmbeddingError::EmptyInput);
    }

    let dim = embeddings[0].len();
    for e in embeddings {
        if e.len() != dim {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: e.len(),
            });
        }
    }

    let n = embeddings.len() as f32;
    let mut result = vec![0.0f32; dim];

    for embedding in embeddings {
        for (i, val) in embedding.iter().enumerate() {
            result[i] += val / n;
        }
    }

    Ok(result)
}
