//! # Advisory Classifier
//!
//! Two-stage classification of security advisories against a fixed
//! technique taxonomy:
//!
//! 1. **Pre-filter**: embedding similarity narrows the taxonomy to a
//!    candidate shortlist (cheap, approximate)
//! 2. **Refinement**: a completion model picks the best matches from
//!    the shortlist under a strict JSON contract (precise, constrained)
//!
//! The [`ClassificationPipeline`] orchestrates both stages with
//! per-document failure isolation: a document that cannot be
//! classified yields an empty, `unknown`-confidence result instead of
//! aborting the batch.

pub mod error;
pub mod llm;
pub mod pipeline;
pub mod refiner;
pub mod result;

pub use error::{ClassifierError, Result};
pub use llm::{CompletionProvider, OpenAiCompletionProvider};
pub use pipeline::{ClassificationPipeline, PipelineConfig};
pub use refiner::Refiner;
pub use result::{ClassificationResult, Confidence};
