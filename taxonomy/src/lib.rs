//! # Advisory Taxonomy
//!
//! Loads the fixed classification taxonomy (MITRE ATT&CK-style
//! techniques) from a static JSON resource, lazily builds one cached
//! embedding per category, and ranks categories against a document by
//! cosine similarity.

pub mod category;
pub mod error;
pub mod ranker;
pub mod store;

pub use category::{Category, CategoryEmbedding};
pub use error::{Result, TaxonomyError};
pub use ranker::{RankedCategory, SimilarityRanker};
pub use store::TaxonomyStore;
