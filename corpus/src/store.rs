//! Durable storage for the enriched corpus.
//!
//! The corpus is a JSON record list keyed by item id, rewritten as a
//! whole on every successful sync. Writes go to a temp file first and
//! are renamed into place, so a crash mid-write never leaves a partial
//! metadata file behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::item::EnrichedRecord;

/// File name for the persisted record list.
const METADATA_FILE: &str = "advisories_metadata.json";

/// File name for the vector index snapshot.
const INDEX_FILE: &str = "vector_index.json";

/// Durable store for enriched records and the index snapshot.
pub struct MetadataStore {
    root: PathBuf,
}

impl MetadataStore {
    /// Create a store rooted at the given directory, creating it if
    /// needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::CreateDirectory(format!("{}: {e}", root.display())))?;

        Ok(Self { root })
    }

    fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Load the persisted record list. A missing file is an empty
    /// corpus, not an error.
    pub async fn load_records(&self) -> Result<Vec<EnrichedRecord>> {
        let path = self.metadata_path();
        if !path.exists() {
            debug!("No metadata file at {}, starting empty", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::ReadFile(format!("{}: {e}", path.display())))?;

        let records: Vec<EnrichedRecord> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;

        info!("Loaded {} persisted records", records.len());
        Ok(records)
    }

    /// Persist the full record list atomically.
    pub async fn save_records(&self, records: &[EnrichedRecord]) -> Result<()> {
        let path = self.metadata_path();
        let content = serde_json::to_string_pretty(records)?;
        self.write_atomic(&path, &content).await?;
        debug!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }

    /// Load the vector index snapshot, if one exists.
    pub async fn load_index_json(&self) -> Result<Option<String>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::ReadFile(format!("{}: {e}", path.display())))?;
        Ok(Some(content))
    }

    /// Persist the vector index snapshot atomically.
    pub async fn save_index_json(&self, json: &str) -> Result<()> {
        let path = self.index_path();
        self.write_atomic(&path, json).await?;
        debug!("Saved index snapshot to {}", path.display());
        Ok(())
    }

    /// Write-to-temp-then-rename so readers never observe a partial
    /// file.
    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, content)
            .await
            .map_err(|e| StoreError::WriteFile(format!("{}: {e}", temp_path.display())))?;

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::WriteFile(format!("{}: {e}", path.display())))?;

        Ok(())
    }
}
