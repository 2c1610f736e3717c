//! Incremental corpus synchronization.
//!
//! The synchronizer diffs the feed against the persisted corpus and
//! classifies only the unseen subset; a force rebuild reclassifies
//! everything from scratch. Item identity is the source-provided id
//! alone: an id already persisted is never re-fetched or reclassified,
//! even if its upstream content changed.

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::json;
use tracing::{debug, info, warn};

use advisory_classifier::ClassificationPipeline;
use advisory_classifier::CompletionProvider;
use advisory_embeddings::EmbeddingProvider;

use crate::error::Result;
use crate::feed::AdvisoryFeed;
use crate::index::{InMemoryVectorIndex, VectorIndex};
use crate::item::{CorpusInfo, CorpusStatus, EnrichedRecord, SourceItem, UpdateCheck};
use crate::store::MetadataStore;

/// Configuration for corpus synchronization.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding the metadata file and index snapshot.
    pub data_dir: PathBuf,

    /// Cap on items taken from a single fetch.
    pub max_items: usize,

    /// Chunk size when embedding enriched records for the index.
    pub chunk_token_size: usize,
}

impl SyncConfig {
    /// Create a configuration with default limits.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_items: 10,
            chunk_token_size: advisory_embeddings::chunked::DEFAULT_CHUNK_TOKEN_SIZE,
        }
    }

    /// Set the per-fetch item cap.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }
}

/// Keeps the persisted corpus and the search index in step with the
/// feed.
///
/// Single-writer: one synchronization pass at a time. Per item,
/// classification completes (success or fallback) before the record is
/// persisted or indexed — a partially classified record is never
/// visible.
pub struct CorpusSynchronizer<F, P, C> {
    feed: F,
    pipeline: ClassificationPipeline<P, C>,
    store: MetadataStore,
    index: InMemoryVectorIndex,
    records: Vec<EnrichedRecord>,
    config: SyncConfig,
}

impl<F, P, C> CorpusSynchronizer<F, P, C>
where
    F: AdvisoryFeed,
    P: EmbeddingProvider,
    C: CompletionProvider,
{
    /// Create a synchronizer, loading any previously persisted corpus
    /// and index snapshot from the configured data directory.
    pub async fn new(
        feed: F,
        pipeline: ClassificationPipeline<P, C>,
        config: SyncConfig,
    ) -> Result<Self> {
        let store = MetadataStore::new(&config.data_dir).await?;
        let records = store.load_records().await?;

        let dimension = pipeline.embedder().provider().default_dimension();
        let index = match store.load_index_json().await? {
            Some(json) => InMemoryVectorIndex::from_json(&json, dimension)?,
            None => InMemoryVectorIndex::new(dimension),
        };

        info!(
            "Corpus synchronizer ready: {} records, {} index entries",
            records.len(),
            index.len()
        );

        Ok(Self {
            feed,
            pipeline,
            store,
            index,
            records,
            config,
        })
    }

    /// Fetch current items, honoring the per-fetch cap.
    async fn fetch_capped(&self) -> Result<Vec<SourceItem>> {
        let mut items = self.feed.fetch().await?;
        if items.len() > self.config.max_items {
            debug!(
                "Capping fetch from {} to {} items",
                items.len(),
                self.config.max_items
            );
            items.truncate(self.config.max_items);
        }
        Ok(items)
    }

    /// Check the feed for unseen items without mutating any state.
    pub async fn check_for_updates(&self) -> Result<UpdateCheck> {
        let fetched = self.fetch_capped().await?;

        let known: HashSet<&str> = self.records.iter().map(|r| r.item.id.as_str()).collect();
        let preview: Vec<SourceItem> = fetched
            .into_iter()
            .filter(|item| !known.contains(item.id.as_str()))
            .collect();

        Ok(UpdateCheck {
            has_updates: !preview.is_empty(),
            new_count: preview.len(),
            preview,
        })
    }

    /// Synchronize the corpus with the feed.
    ///
    /// Incremental (`force_rebuild = false`): classify only items whose
    /// id is not yet persisted, append their records, and insert their
    /// index entries incrementally. An empty diff is a no-op with zero
    /// classification calls.
    ///
    /// Force rebuild: discard the persisted corpus and index,
    /// reclassify every fetched item, and persist the full replacement
    /// — O(n) external classification calls.
    ///
    /// In-memory state is only committed after both the metadata file
    /// and the index snapshot have been written.
    pub async fn sync(&mut self, force_rebuild: bool) -> Result<&[EnrichedRecord]> {
        let fetched = self.fetch_capped().await?;

        let (staged_records, staged_index) = if force_rebuild {
            info!("Force rebuild: reclassifying {} items", fetched.len());

            let mut index = InMemoryVectorIndex::new(self.index.dimension());
            let mut records = Vec::with_capacity(fetched.len());
            for item in fetched {
                let record = self.classify_and_index(item, &mut index).await;
                records.push(record);
            }
            (records, index)
        } else {
            let known: HashSet<&str> = self.records.iter().map(|r| r.item.id.as_str()).collect();
            let new_items: Vec<SourceItem> = fetched
                .into_iter()
                .filter(|item| !known.contains(item.id.as_str()))
                .collect();

            if new_items.is_empty() {
                debug!("No new items, corpus unchanged");
                return Ok(&self.records);
            }

            info!("Classifying {} new items", new_items.len());

            let mut index = self.index.clone();
            let mut records = self.records.clone();
            for item in new_items {
                let record = self.classify_and_index(item, &mut index).await;
                records.push(record);
            }
            (records, index)
        };

        // Persist before committing anything in memory.
        self.store.save_records(&staged_records).await?;
        self.store.save_index_json(&staged_index.to_json()?).await?;

        self.records = staged_records;
        self.index = staged_index;

        info!("Sync complete: corpus holds {} records", self.records.len());
        Ok(&self.records)
    }

    /// Classify one item and stage its index entry.
    ///
    /// Classification itself never fails (the pipeline degrades to an
    /// unclassified result). An embedding failure while indexing the
    /// enriched text is logged and the entry skipped; the record is
    /// still persisted.
    async fn classify_and_index(
        &self,
        item: SourceItem,
        index: &mut InMemoryVectorIndex,
    ) -> EnrichedRecord {
        let classification = self.pipeline.classify(&item.id, &item.content).await;
        let record = EnrichedRecord::new(item, classification);

        match self
            .pipeline
            .embedder()
            .embed_long(&record.enriched_text(), self.config.chunk_token_size)
            .await
        {
            Ok(embedding) => {
                let metadata = json!({
                    "id": record.item.id,
                    "title": record.item.title,
                    "published": record.item.published,
                    "link": record.item.link,
                    "mapped_categories": record.classification.mapped_categories,
                    "confidence": record.classification.confidence,
                });
                if let Err(e) = index.insert(&record.item.id, embedding, Some(metadata)) {
                    warn!("Failed to index {}: {e}", record.item.id);
                }
            }
            Err(e) => {
                warn!(
                    "Skipping index entry for {}: embedding failed: {e}",
                    record.item.id
                );
            }
        }

        record
    }

    /// The enriched corpus, in persistence order.
    pub fn get_corpus(&self) -> &[EnrichedRecord] {
        &self.records
    }

    /// The search index over enriched records.
    pub fn index(&self) -> &InMemoryVectorIndex {
        &self.index
    }

    /// Summary of the persisted corpus state.
    pub fn get_cache_info(&self) -> CorpusInfo {
        if self.records.is_empty() {
            return CorpusInfo {
                status: CorpusStatus::Empty,
                count: 0,
                latest_date: None,
            };
        }

        let latest_date = self
            .records
            .iter()
            .map(|r| r.item.published.as_str())
            .max()
            .map(|published| published.chars().take(10).collect());

        CorpusInfo {
            status: CorpusStatus::Loaded,
            count: self.records.len(),
            latest_date,
        }
    }
}
