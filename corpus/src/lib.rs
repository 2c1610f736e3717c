//! # Advisory Corpus
//!
//! Owns the enriched advisory corpus: fetching source items from a
//! feed, diffing against what is already persisted, classifying only
//! the unseen subset, and keeping the metadata file and the vector
//! index in step.
//!
//! ## Data flow
//!
//! ```text
//! AdvisoryFeed ──► CorpusSynchronizer ──► ClassificationPipeline
//!                        │
//!                        ├──► MetadataStore (atomic JSON record list)
//!                        └──► VectorIndex   (incremental insertion)
//! ```

pub mod error;
pub mod feed;
pub mod index;
pub mod item;
pub mod store;
pub mod sync;

pub use error::{CorpusError, Result, StoreError};
pub use feed::AdvisoryFeed;
pub use index::{InMemoryVectorIndex, VectorIndex};
pub use item::{CorpusInfo, CorpusStatus, EnrichedRecord, SourceItem, UpdateCheck};
pub use store::MetadataStore;
pub use sync::{CorpusSynchronizer, SyncConfig};
