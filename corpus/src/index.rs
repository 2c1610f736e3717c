//! The vector index capability.
//!
//! The synchronizer only needs `insert` and `search` with incremental
//! insertion (adding one record never triggers a reindex). The
//! in-memory implementation wraps the embeddings crate's
//! [`SimilarityIndex`] and snapshots to JSON for persistence across
//! runs.

use advisory_embeddings::{Embedding, SimilarityIndex, SimilarityResult};

use crate::error::Result;

/// Capability interface for the search index.
pub trait VectorIndex: Send + Sync {
    /// Insert one entry. Must not require reindexing existing entries.
    fn insert(
        &mut self,
        id: &str,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()>;

    /// Ranked similarity search.
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SimilarityResult>>;

    /// Whether an id is already indexed.
    fn contains(&self, id: &str) -> bool;

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Whether the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&mut self);
}

/// In-memory vector index with JSON snapshots.
#[derive(Clone)]
pub struct InMemoryVectorIndex {
    inner: SimilarityIndex,
    dimension: usize,
}

impl InMemoryVectorIndex {
    /// Create an empty index expecting vectors of `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: SimilarityIndex::new(dimension),
            dimension,
        }
    }

    /// Restore an index from a JSON snapshot.
    pub fn from_json(json: &str, dimension: usize) -> Result<Self> {
        let inner = SimilarityIndex::from_json(json, dimension)?;
        Ok(Self { inner, dimension })
    }

    /// Serialize the index for persistence.
    pub fn to_json(&self) -> Result<String> {
        Ok(self.inner.to_json()?)
    }

    /// The dimension this index expects.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn insert(
        &mut self,
        id: &str,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        self.inner.insert(id, embedding, metadata)?;
        Ok(())
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SimilarityResult>> {
        Ok(self.inner.search(query, k)?)
    }

    fn contains(&self, id: &str) -> bool {
        self.inner.contains(id)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_incremental_insert_and_search() {
        let mut index = InMemoryVectorIndex::new(2);
        index.insert("a", vec![1.0, 0.0], None).unwrap();
        index.insert("b", vec![0.0, 1.0], None).unwrap();

        let results = index.search(&vec![1.0, 0.1], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut index = InMemoryVectorIndex::new(2);
        index
            .insert("a", vec![1.0, 0.0], Some(serde_json::json!({"title": "A"})))
            .unwrap();

        let json = index.to_json().unwrap();
        let restored = InMemoryVectorIndex::from_json(&json, 2).unwrap();

        assert_eq!(restored.len(), 1);
        assert!(restored.contains("a"));
    }
}
