//! The advisory feed contract.
//!
//! Transport mechanics (RSS parsing, HTTP retries) live behind this
//! trait; the synchronizer only depends on the contract: a fetch
//! returns a list of minimally populated items whose ids stay stable
//! across fetches.

use async_trait::async_trait;

use crate::error::Result;
use crate::item::SourceItem;

/// A source of advisory items.
///
/// Implementations must keep ids stable: fetching twice in quick
/// succession returns a consistent superset, and an id seen once
/// refers to the same advisory forever. Failures surface as
/// [`crate::CorpusError::Fetch`] and never affect the persisted
/// corpus.
#[async_trait]
pub trait AdvisoryFeed: Send + Sync {
    /// Fetch the current advisory items, newest first.
    async fn fetch(&self) -> Result<Vec<SourceItem>>;
}
