//! Error types for the classification system.

use thiserror::Error;

/// Result type alias for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Errors that can occur during classification.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Completion provider not configured.
    #[error("completion provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The model's reply did not honor the JSON contract.
    #[error("refinement parse error: {message}")]
    RefinementParse { message: String, raw: String },

    /// Embedding stage failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] advisory_embeddings::EmbeddingError),

    /// Taxonomy access failed.
    #[error("taxonomy error: {0}")]
    Taxonomy(#[from] advisory_taxonomy::TaxonomyError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
