//! Classification pipeline orchestration.
//!
//! Per document the pipeline runs FETCH_CANDIDATES (similarity
//! pre-filter) then REFINE (LLM over the shortlist). When no taxonomy
//! embeddings are available it degrades to a REFINE_ONLY path that
//! hands the full taxonomy to the refiner — trading prompt cost for
//! completeness rather than failing.

use std::sync::Arc;

use tracing::{debug, warn};

use advisory_embeddings::{ChunkedEmbedder, EmbeddingProvider};
use advisory_taxonomy::{Category, SimilarityRanker, TaxonomyStore};

use crate::llm::CompletionProvider;
use crate::refiner::Refiner;
use crate::result::ClassificationResult;

/// Configuration for the classification pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of shortlist candidates from the pre-filter.
    pub top_k: usize,

    /// Chunk size for long-document embedding.
    pub chunk_token_size: usize,

    /// Whether to fall back to refining over the full taxonomy when
    /// the embedding stage is unavailable.
    pub refine_only_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            chunk_token_size: advisory_embeddings::chunked::DEFAULT_CHUNK_TOKEN_SIZE,
            refine_only_fallback: true,
        }
    }
}

/// Orchestrates the two-stage classification of a single document.
pub struct ClassificationPipeline<P, C> {
    embedder: ChunkedEmbedder<P>,
    taxonomy: Arc<TaxonomyStore>,
    ranker: SimilarityRanker,
    refiner: Refiner<C>,
    config: PipelineConfig,
}

impl<P, C> ClassificationPipeline<P, C>
where
    P: EmbeddingProvider,
    C: CompletionProvider,
{
    /// Create a new pipeline.
    pub fn new(
        embedder: ChunkedEmbedder<P>,
        taxonomy: Arc<TaxonomyStore>,
        refiner: Refiner<C>,
        config: PipelineConfig,
    ) -> Self {
        let ranker = SimilarityRanker::new(config.chunk_token_size);
        Self {
            embedder,
            taxonomy,
            ranker,
            refiner,
            config,
        }
    }

    /// The embedder this pipeline classifies with.
    pub fn embedder(&self) -> &ChunkedEmbedder<P> {
        &self.embedder
    }

    /// The taxonomy this pipeline classifies against.
    pub fn taxonomy(&self) -> &Arc<TaxonomyStore> {
        &self.taxonomy
    }

    /// Classify one document.
    ///
    /// Never fails: any error at either stage is caught, logged, and
    /// surfaced as [`ClassificationResult::unclassified`]. A single
    /// bad document must not stop processing of the rest of a batch.
    pub async fn classify(&self, document_id: &str, document_text: &str) -> ClassificationResult {
        let candidates = match self.fetch_candidates(document_text).await {
            Some(candidates) => candidates,
            None => return ClassificationResult::unclassified(),
        };

        if candidates.is_empty() {
            debug!("No taxonomy categories available, leaving {document_id} unclassified");
            return ClassificationResult::unclassified();
        }

        match self.refiner.refine(document_text, &candidates).await {
            Ok(result) => {
                debug!(
                    "Classified {document_id}: {:?} ({:?})",
                    result.mapped_categories, result.confidence
                );
                result
            }
            Err(e) => {
                warn!("Refinement failed for {document_id}: {e}");
                ClassificationResult::unclassified()
            }
        }
    }

    /// Produce the candidate shortlist for the refiner.
    ///
    /// Returns `None` only when the embedding stage failed and the
    /// refine-only fallback is disabled.
    async fn fetch_candidates(&self, document_text: &str) -> Option<Vec<Category>> {
        let ranked = match self.taxonomy.embeddings(&self.embedder).await {
            Ok(embeddings) => {
                self.ranker
                    .rank(&self.embedder, document_text, &embeddings, self.config.top_k)
                    .await
            }
            Err(e) => Err(e),
        };

        match ranked {
            Ok(ranked) => Some(ranked.into_iter().map(|r| r.category).collect()),
            Err(e) if self.config.refine_only_fallback => {
                warn!("Similarity pre-filter unavailable ({e}), refining over the full taxonomy");
                Some(self.taxonomy.categories().to_vec())
            }
            Err(e) => {
                warn!("Similarity pre-filter unavailable and fallback disabled: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use advisory_embeddings::{EmbeddingError, EmbeddingRequest, EmbeddingResponse};

    use crate::error::Result;
    use crate::result::Confidence;

    const TAXONOMY: &str = r#"[
        {"Id": "T1", "name": "Spoofing", "description": "alpha", "tactics": []},
        {"Id": "T2", "name": "Drive-by", "description": "beta", "tactics": []},
        {"Id": "T3", "name": "Brute Force", "description": "gamma", "tactics": []}
    ]"#;

    /// Embeds category texts along distinct axes and every document as
    /// a vector closest to T2.
    struct AxisProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl AxisProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for AxisProvider {
        fn name(&self) -> &str {
            "axis"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        fn default_dimension(&self) -> usize {
            3
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> advisory_embeddings::Result<EmbeddingResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::ApiRequest("provider down".to_string()));
            }
            let embedding = if request.text.contains("alpha") {
                vec![1.0, 0.0, 0.0]
            } else if request.text.contains("beta") {
                vec![0.0, 1.0, 0.0]
            } else if request.text.contains("gamma") {
                vec![0.0, 0.0, 1.0]
            } else {
                // Document: closest to T2.
                vec![0.2, 1.0, 0.1]
            };
            Ok(EmbeddingResponse {
                embedding,
                model: "test-model".to_string(),
                dimension: 3,
                tokens_used: None,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    /// Scripted completion provider that records candidate ids it saw.
    struct ScriptedProvider {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn pipeline(
        provider: AxisProvider,
        reply: &str,
        config: PipelineConfig,
    ) -> ClassificationPipeline<AxisProvider, ScriptedProvider> {
        let taxonomy = Arc::new(TaxonomyStore::from_json(TAXONOMY).unwrap());
        ClassificationPipeline::new(
            ChunkedEmbedder::new(provider),
            taxonomy,
            Refiner::new(ScriptedProvider::new(reply)),
            config,
        )
    }

    #[tokio::test]
    async fn test_classify_two_stage() {
        let config = PipelineConfig {
            top_k: 2,
            ..PipelineConfig::default()
        };
        let p = pipeline(
            AxisProvider::new(),
            r#"{"mapped_techniques": ["T2"], "confidence": "high"}"#,
            config,
        );

        let result = p.classify("adv-1", "advisory body").await;

        assert_eq!(result.mapped_categories, vec!["T2".to_string()]);
        assert_eq!(result.confidence, Confidence::High);

        // The shortlist held top_k = 2 candidates, led by T2.
        let prompts = p.refiner.provider().prompts.lock().unwrap();
        assert!(prompts[0].contains("\"T2\""));
    }

    #[tokio::test]
    async fn test_refinement_failure_yields_unclassified() {
        let p = pipeline(AxisProvider::new(), "not json", PipelineConfig::default());

        let result = p.classify("adv-1", "advisory body").await;

        assert!(result.mapped_categories.is_empty());
        assert_eq!(result.confidence, Confidence::Unknown);
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_full_taxonomy() {
        let p = pipeline(
            AxisProvider::failing(),
            r#"{"mapped_techniques": ["T3"], "confidence": "low"}"#,
            PipelineConfig::default(),
        );

        let result = p.classify("adv-1", "advisory body").await;

        // REFINE_ONLY path: the refiner still ran, over all of T1-T3.
        assert_eq!(result.mapped_categories, vec!["T3".to_string()]);
        let prompts = p.refiner.provider().prompts.lock().unwrap();
        assert!(prompts[0].contains("\"T1\""));
        assert!(prompts[0].contains("\"T2\""));
        assert!(prompts[0].contains("\"T3\""));
    }

    #[tokio::test]
    async fn test_embedding_failure_without_fallback() {
        let config = PipelineConfig {
            refine_only_fallback: false,
            ..PipelineConfig::default()
        };
        let p = pipeline(
            AxisProvider::failing(),
            r#"{"mapped_techniques": ["T1"]}"#,
            config,
        );

        let result = p.classify("adv-1", "advisory body").await;

        assert!(result.mapped_categories.is_empty());
        assert_eq!(result.confidence, Confidence::Unknown);
        // The refiner was never invoked.
        assert!(p.refiner.provider().prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_taxonomy_skips_refinement() {
        let taxonomy = Arc::new(TaxonomyStore::from_json("[]").unwrap());
        let p = ClassificationPipeline::new(
            ChunkedEmbedder::new(AxisProvider::new()),
            taxonomy,
            Refiner::new(ScriptedProvider::new(r#"{"mapped_techniques": ["T1"]}"#)),
            PipelineConfig::default(),
        );

        let result = p.classify("adv-1", "advisory body").await;

        assert!(result.mapped_categories.is_empty());
        assert!(p.refiner.provider().prompts.lock().unwrap().is_empty());
    }
}
