//! Error types for the corpus system.

use thiserror::Error;

/// Result type alias for corpus operations.
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Errors that can occur while synchronizing or persisting the corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The source feed is unreachable or returned garbage.
    ///
    /// Surfaced to the caller of `sync`/`check_for_updates` with zero
    /// items affected; the persisted corpus is untouched.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Persistence failed. Fatal for the sync pass; in-memory state is
    /// not committed until the write succeeds.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Embedding failed while indexing.
    #[error("embedding error: {0}")]
    Embedding(#[from] advisory_embeddings::EmbeddingError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create the storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a persisted file.
    #[error("failed to read file: {0}")]
    ReadFile(String),

    /// Failed to write a persisted file.
    #[error("failed to write file: {0}")]
    WriteFile(String),

    /// A persisted file does not parse.
    #[error("corrupt store file: {0}")]
    Corrupt(String),
}
