//! Typed records for source items and enriched corpus entries.
//!
//! These replace the loosely-typed advisory dictionaries of the
//! upstream feed with explicit records validated at the ingestion
//! boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use advisory_classifier::ClassificationResult;

/// A raw fetched document from the advisory feed.
///
/// The `id` is the sole dedup key and must be stable across fetches.
/// Items are immutable once fetched and are not owned by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Unique, stable identifier.
    pub id: String,

    /// Advisory title.
    pub title: String,

    /// Advisory summary (may contain markup).
    pub summary: String,

    /// Link to the advisory.
    pub link: String,

    /// Published timestamp, as reported by the feed.
    pub published: String,

    /// Concatenated text used for embedding and LLM input.
    pub content: String,
}

/// A source item plus its computed classification — the unit persisted
/// and indexed.
///
/// Records are never mutated after creation; reprocessing an item means
/// storing a new record under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// The fetched item.
    pub item: SourceItem,

    /// Its classification.
    pub classification: ClassificationResult,

    /// When the record was created.
    pub enriched_at: DateTime<Utc>,
}

impl EnrichedRecord {
    /// Create a record for an item classified just now.
    pub fn new(item: SourceItem, classification: ClassificationResult) -> Self {
        Self {
            item,
            classification,
            enriched_at: Utc::now(),
        }
    }

    /// Render the text block that gets embedded and indexed for this
    /// record: the advisory fields plus the technique mapping.
    pub fn enriched_text(&self) -> String {
        format!(
            "Title: {}\nSummary: {}\nPublished: {}\nLink: {}\n\nMapped Techniques: {}\nConfidence: {:?}\n\nFull Content: {}",
            self.item.title,
            self.item.summary,
            self.item.published,
            self.item.link,
            self.classification.mapped_categories.join(", "),
            self.classification.confidence,
            self.item.content,
        )
    }
}

/// Result of a read-only update check against the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheck {
    /// Whether any unseen items were found.
    pub has_updates: bool,

    /// Number of unseen items.
    pub new_count: usize,

    /// The unseen items themselves.
    pub preview: Vec<SourceItem>,
}

/// State of the persisted corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusStatus {
    /// No records persisted yet.
    Empty,
    /// At least one record loaded.
    Loaded,
}

/// Summary information about the persisted corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusInfo {
    /// Whether anything is loaded.
    pub status: CorpusStatus,

    /// Number of persisted records.
    pub count: usize,

    /// Date (YYYY-MM-DD) of the most recently published record, if
    /// any.
    pub latest_date: Option<String>,
}
