//! Error types for the taxonomy system.

use thiserror::Error;

/// Result type alias for taxonomy operations.
pub type Result<T> = std::result::Result<T, TaxonomyError>;

/// Errors that can occur while loading or embedding the taxonomy.
///
/// The load-time variants are fatal to startup: a process with no
/// valid taxonomy has nothing to classify against.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// The static taxonomy resource is missing.
    #[error("taxonomy resource not found: {0}")]
    ResourceNotFound(String),

    /// The resource is not valid structured data.
    #[error("malformed taxonomy resource: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An entry is missing a required field.
    #[error("taxonomy entry {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// Embedding generation failed while building the category cache.
    #[error("embedding error: {0}")]
    Embedding(#[from] advisory_embeddings::EmbeddingError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
