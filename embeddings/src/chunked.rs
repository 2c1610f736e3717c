//! Chunked embedding for long documents.
//!
//! Providers have a bounded context window, but advisories can be
//! arbitrarily long. The `ChunkedEmbedder` splits long text into
//! token chunks, embeds each chunk, and mean-pools the results into a
//! single representative vector. Unweighted mean pooling is a
//! deliberate simplification: the pooled vector only feeds a ranking
//! pre-filter, not a precision-critical computation.

use tracing::debug;

use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingRequest};
use crate::similarity::mean;
use crate::Embedding;

/// Default chunk size, in whitespace tokens.
pub const DEFAULT_CHUNK_TOKEN_SIZE: usize = 512;

/// Embedder adapter over an [`EmbeddingProvider`].
///
/// Adds `embed_long` on top of the raw provider contract so callers
/// never have to reason about the provider's context limit.
pub struct ChunkedEmbedder<P> {
    provider: P,
}

impl<P> ChunkedEmbedder<P>
where
    P: EmbeddingProvider,
{
    /// Create a new chunked embedder wrapping the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Embed text that fits within the provider's context limit.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let response = self.provider.embed(EmbeddingRequest::new(text)).await?;
        Ok(response.embedding)
    }

    /// Embed text of unbounded length.
    ///
    /// Tokenizes on whitespace, splits into contiguous chunks of at
    /// most `chunk_token_size` tokens (the last chunk may be shorter),
    /// embeds each chunk independently, and returns the elementwise
    /// mean of the chunk vectors. A provider failure on any chunk
    /// propagates; a degraded vector is never returned, since the
    /// downstream ranker needs a numerically valid embedding.
    pub async fn embed_long(&self, text: &str, chunk_token_size: usize) -> Result<Embedding> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let chunk_size = chunk_token_size.max(1);
        if tokens.len() <= chunk_size {
            return self.embed(text).await;
        }

        let chunks: Vec<String> = tokens
            .chunks(chunk_size)
            .map(|chunk| chunk.join(" "))
            .collect();

        debug!(
            "Embedding {} tokens as {} chunks of <= {chunk_size}",
            tokens.len(),
            chunks.len()
        );

        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            vectors.push(self.embed(chunk).await?);
        }

        mean(&vectors)
    }
}
