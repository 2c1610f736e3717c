//! Taxonomy loading and the per-category embedding cache.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use advisory_embeddings::{ChunkedEmbedder, EmbeddingProvider};

use crate::category::{parse_categories, Category, CategoryEmbedding};
use crate::error::{Result, TaxonomyError};

/// Chunk size used when a category description exceeds the provider's
/// comfortable context.
const CATEGORY_CHUNK_TOKEN_SIZE: usize = 512;

/// Store for the fixed category taxonomy.
///
/// Categories are loaded once from a static resource and never
/// mutated. Embeddings are computed lazily on the first call to
/// [`TaxonomyStore::embeddings`] and cached for the store's lifetime —
/// one provider call per category, and only ever once.
#[derive(Debug)]
pub struct TaxonomyStore {
    categories: Vec<Category>,

    /// All-or-nothing embedding cache.
    embeddings: RwLock<Option<Arc<Vec<CategoryEmbedding>>>>,
}

impl TaxonomyStore {
    /// Load the taxonomy from a static JSON resource on disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|_| TaxonomyError::ResourceNotFound(path.display().to_string()))?;

        let store = Self::from_json(&json)?;
        info!(
            "Loaded {} taxonomy categories from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Build the taxonomy from an in-memory JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let categories = parse_categories(json)?;
        Ok(Self {
            categories,
            embeddings: RwLock::new(None),
        })
    }

    /// The categories in resource order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the taxonomy is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Get the embeddings for every category, computing and caching
    /// them on first call.
    ///
    /// The first invocation makes one provider call per category (an
    /// O(#categories) external cost); later invocations return the
    /// cached vectors without touching the provider. On any provider
    /// failure the cache is left empty — it is never partially filled.
    pub async fn embeddings<P>(
        &self,
        embedder: &ChunkedEmbedder<P>,
    ) -> Result<Arc<Vec<CategoryEmbedding>>>
    where
        P: EmbeddingProvider,
    {
        if let Some(cached) = self.embeddings.read().await.as_ref() {
            debug!("Returning {} cached category embeddings", cached.len());
            return Ok(Arc::clone(cached));
        }

        let mut write_guard = self.embeddings.write().await;
        // Another caller may have filled the cache while we waited.
        if let Some(cached) = write_guard.as_ref() {
            return Ok(Arc::clone(cached));
        }

        info!("Computing embeddings for {} categories", self.len());

        let mut computed = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            let source_text = category.source_text();
            let embedding = embedder
                .embed_long(&source_text, CATEGORY_CHUNK_TOKEN_SIZE)
                .await?;
            computed.push(CategoryEmbedding {
                category: category.clone(),
                source_text,
                embedding,
            });
        }

        let computed = Arc::new(computed);
        *write_guard = Some(Arc::clone(&computed));
        info!("Cached {} category embeddings", computed.len());
        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use advisory_embeddings::{EmbeddingError, EmbeddingRequest, EmbeddingResponse};

    const SAMPLE: &str = r#"[
        {"Id": "T1", "name": "Spoofing", "description": "Reporting message spoofing", "tactics": ["evasion"]},
        {"Id": "T2", "name": "Drive-by", "description": "Compromise via browser", "tactics": ["initial-access"]},
        {"Id": "T3", "name": "Brute Force", "description": "Credential guessing", "tactics": ["lateral-movement"]}
    ]"#;

    struct CountingProvider {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }

        fn failing_after(n: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: Some(n),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
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
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = self.fail_after {
                if n >= limit {
                    return Err(EmbeddingError::ApiRequest("provider down".to_string()));
                }
            }
            let len = request.text.len() as f32;
            Ok(EmbeddingResponse {
                embedding: vec![len, 1.0, 0.0],
                model: "test-model".to_string(),
                dimension: 3,
                tokens_used: None,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_embeddings_one_per_category() {
        let store = TaxonomyStore::from_json(SAMPLE).unwrap();
        let embedder = ChunkedEmbedder::new(CountingProvider::new());

        let embeddings = store.embeddings(&embedder).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        let ids: Vec<&str> = embeddings.iter().map(|e| e.category.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_embeddings_cached_without_second_call() {
        let store = TaxonomyStore::from_json(SAMPLE).unwrap();
        let embedder = ChunkedEmbedder::new(CountingProvider::new());

        let first = store.embeddings(&embedder).await.unwrap();
        assert_eq!(embedder.provider().call_count(), 3);

        let second = store.embeddings(&embedder).await.unwrap();
        assert_eq!(embedder.provider().call_count(), 3);

        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.embedding, b.embedding);
        }
    }

    #[tokio::test]
    async fn test_embeddings_never_partially_filled() {
        let store = TaxonomyStore::from_json(SAMPLE).unwrap();

        let failing = ChunkedEmbedder::new(CountingProvider::failing_after(1));
        assert!(store.embeddings(&failing).await.is_err());

        // A later call with a healthy provider recomputes everything.
        let healthy = ChunkedEmbedder::new(CountingProvider::new());
        let embeddings = store.embeddings(&healthy).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(healthy.provider().call_count(), 3);
    }

    #[tokio::test]
    async fn test_load_missing_resource() {
        let err = TaxonomyStore::load("/nonexistent/taxonomy.json")
            .await
            .unwrap_err();
        assert!(matches!(err, TaxonomyError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let store = TaxonomyStore::load(&path).await.unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.categories()[1].name, "Drive-by");
    }
}
