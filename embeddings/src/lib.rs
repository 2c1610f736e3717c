//! # Advisory Embeddings
//!
//! Embedding generation and similarity search for the advisory
//! classification pipeline.
//!
//! ## Features
//!
//! - **Embedding Generation**: Convert text to dense vectors via an
//!   embedding provider
//! - **Chunked Embeddings**: Mean-pooled embeddings over long documents
//! - **Similarity Search**: Cosine similarity and top-k ranking
//! - **Vector Index**: Incremental insertion and ranked search

pub mod chunked;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use chunked::ChunkedEmbedder;
pub use error::{EmbeddingError, Result};
pub use index::{IndexEntry, SimilarityIndex};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAiProvider};
pub use similarity::{cosine_similarity, mean, SimilarityResult};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
