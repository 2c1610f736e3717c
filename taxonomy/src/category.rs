//! Taxonomy categories and their derived embeddings.

use serde::{Deserialize, Serialize};

use advisory_embeddings::Embedding;

use crate::error::{Result, TaxonomyError};

/// One fixed entry in the classification taxonomy.
///
/// Categories are immutable once loaded and live for the process
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable unique identifier (e.g. "T0821").
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Technique description.
    pub description: String,

    /// Tactic tags this technique belongs to.
    #[serde(default)]
    pub tactics: Vec<String>,
}

impl Category {
    /// The text a category embedding is computed from: name,
    /// description, and tactic tags concatenated.
    pub fn source_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.description,
            self.tactics.join(" ")
        )
        .trim()
        .to_string()
    }
}

/// A category embedding: the derived vector plus the text it was
/// computed from and the category it belongs to.
///
/// There is exactly one embedding per category id; the cache holding
/// these is filled all-or-nothing, never partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEmbedding {
    /// The category this embedding was derived from.
    pub category: Category,

    /// The text the embedding was computed from.
    pub source_text: String,

    /// The embedding vector.
    pub embedding: Embedding,
}

/// Raw entry shape accepted from the static resource.
///
/// The upstream data set spells the id field `Id`; every other field is
/// validated explicitly so a broken entry reports which field is
/// missing rather than a bare parse error.
#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(alias = "Id")]
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tactics: Vec<String>,
}

/// Parse and validate the category list from JSON.
pub(crate) fn parse_categories(json: &str) -> Result<Vec<Category>> {
    let raw: Vec<RawCategory> = serde_json::from_str(json)?;

    let mut categories = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        let id = entry
            .id
            .filter(|s| !s.is_empty())
            .ok_or(TaxonomyError::MissingField { index, field: "id" })?;
        let name = entry.name.ok_or(TaxonomyError::MissingField {
            index,
            field: "name",
        })?;
        let description = entry.description.ok_or(TaxonomyError::MissingField {
            index,
            field: "description",
        })?;

        categories.push(Category {
            id,
            name,
            description,
            tactics: entry.tactics,
        });
    }

    Ok(categories)
}
