//! Similarity index for ranked embedding lookups.
//!
//! Supports incremental insertion: adding one entry never requires
//! touching the others.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::similarity::{find_top_k, SimilarityResult};
use crate::Embedding;

/// An entry in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier.
    pub id: String,

    /// The embedding vector.
    pub embedding: Embedding,

    /// Associated metadata.
    pub metadata: Option<serde_json::Value>,
}

/// A similarity index for ranked vector lookups using cosine
/// similarity.
#[derive(Clone)]
pub struct SimilarityIndex {
    /// Stored entries.
    entries: HashMap<String, IndexEntry>,

    /// Expected dimension of embeddings.
    dimension: usize,
}

impl SimilarityIndex {
    /// Create a new similarity index.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: HashMap::new(),
            dimension,
        }
    }

    /// Insert an embedding into the index.
    ///
    /// Inserting an existing id replaces its entry.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        let id = id.into();

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let entry = IndexEntry {
            id: id.clone(),
            embedding,
            metadata,
        };

        self.entries.insert(id.clone(), entry);
        debug!("Added embedding to index: {id}");

        Ok(())
    }

    /// Get an entry by ID.
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    /// Check if an ID exists in the index.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search for the k most similar entries.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SimilarityResult>> {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let candidates: Vec<(String, Embedding)> = self
            .entries
            .values()
            .map(|e| (e.id.clone(), e.embedding.clone()))
            .collect();

        let mut results = find_top_k(query, &candidates, k)?;

        for result in &mut results {
            if let Some(entry) = self.entries.get(&result.id) {
                result.metadata = entry.metadata.clone();
            }
        }

        Ok(results)
    }

    /// Get all IDs in the index.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Clear the index.
    pub fn clear(&mut self) {
        self.entries.clear();
        info!("Cleared similarity index");
    }

    /// Serialize the index to JSON.
    pub fn to_json(&self) -> Result<String> {
        let entries: Vec<&IndexEntry> = self.entries.values().collect();
        Ok(serde_json::to_string(&entries)?)
    }

    /// Load an index from JSON.
    pub fn from_json(json: &str, dimension: usize) -> Result<Self> {
        let entries: Vec<IndexEntry> = serde_json::from_str(json)?;

        let mut index = Self::new(dimension);
        for entry in entries {
            if entry.embedding.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.embedding.len(),
                });
            }
            index.entries.insert(entry.id.clone(), entry);
        }

        info!("Loaded {} entries into similarity index", index.len());
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_insert_and_contains() {
        let mut index = SimilarityIndex::new(3);
        index.insert("item1", vec![1.0, 0.0, 0.0], None).unwrap();

        assert!(index.contains("item1"));
        assert!(!index.contains("item2"));
    }

    #[test]
    fn test_index_search() {
        let mut index = SimilarityIndex::new(3);
        index.insert("a", vec![1.0, 0.0, 0.0], None).unwrap();
        index.insert("b", vec![0.0, 1.0, 0.0], None).unwrap();
        index.insert("c", vec![0.7, 0.7, 0.0], None).unwrap();

        let query = vec![1.0, 0.0, 0.0];
        let results = index.search(&query, 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = SimilarityIndex::new(3);
        let result = index.insert("bad", vec![1.0, 0.0], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut index = SimilarityIndex::new(2);
        index
            .insert("a", vec![1.0, 0.0], Some(serde_json::json!({"title": "A"})))
            .unwrap();

        let json = index.to_json().unwrap();
        let restored = SimilarityIndex::from_json(&json, 2).unwrap();

        assert_eq!(restored.len(), 1);
        assert!(restored.contains("a"));
        assert_eq!(
            restored.get("a").unwrap().metadata,
            Some(serde_json::json!({"title": "A"}))
        );
    }
}
