//! Classification results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Confidence reported by the refinement stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
    /// No confidence available: the document was not classified.
    #[default]
    Unknown,
}

/// The outcome of classifying one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Matched category ids, most relevant first. At most 3.
    pub mapped_categories: Vec<String>,

    /// Per-category reasoning, when the model provided it.
    #[serde(default)]
    pub reasoning: HashMap<String, String>,

    /// Overall mapping confidence.
    #[serde(default)]
    pub confidence: Confidence,
}

impl ClassificationResult {
    /// The degraded-but-valid result for a document that could not be
    /// classified: empty mapping, unknown confidence.
    pub fn unclassified() -> Self {
        Self {
            mapped_categories: Vec::new(),
            reasoning: HashMap::new(),
            confidence: Confidence::Unknown,
        }
    }

    /// Whether any categories were mapped.
    pub fn is_classified(&self) -> bool {
        !self.mapped_categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unclassified_shape() {
        let result = ClassificationResult::unclassified();
        assert!(result.mapped_categories.is_empty());
        assert_eq!(result.confidence, Confidence::Unknown);
        assert!(!result.is_classified());
    }

    #[test]
    fn test_confidence_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Confidence::High).unwrap(),
            "\"high\""
        );
        let parsed: Confidence = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, Confidence::Medium);
    }
}
