//! LLM refinement over a candidate shortlist.
//!
//! The refiner never sees the full taxonomy in the normal path — only
//! the top-k shortlist from the similarity pre-filter. That constrains
//! both the model's output space and the prompt's token cost.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use advisory_taxonomy::Category;

use crate::error::{ClassifierError, Result};
use crate::llm::CompletionProvider;
use crate::result::{ClassificationResult, Confidence};

/// Hard cap on mapped categories per document.
const MAX_MAPPED_CATEGORIES: usize = 3;

/// Refines a candidate shortlist into a final classification via a
/// completion model held to a strict JSON contract.
pub struct Refiner<C> {
    provider: C,
}

/// The JSON shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct RefinerReply {
    mapped_techniques: Vec<String>,
    #[serde(default)]
    reasoning: HashMap<String, String>,
    #[serde(default)]
    confidence: Confidence,
}

impl<C> Refiner<C>
where
    C: CompletionProvider,
{
    /// Create a refiner over the given completion provider.
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &C {
        &self.provider
    }

    /// Ask the model to pick the best-matching categories for the
    /// document from exactly the candidate shortlist.
    ///
    /// The reply must be a bare JSON object with a `mapped_techniques`
    /// array of 0-3 ids drawn from the candidates. A reply that is not
    /// valid JSON, or lacks the array, fails with
    /// [`ClassifierError::RefinementParse`]; ids outside the candidate
    /// set are logged and passed through rather than silently
    /// corrected, so model misbehavior stays visible to callers.
    pub async fn refine(
        &self,
        document_text: &str,
        candidates: &[Category],
    ) -> Result<ClassificationResult> {
        let prompt = build_prompt(document_text, candidates)?;

        debug!(
            "Refining against {} candidates: {:?}",
            candidates.len(),
            candidates.iter().map(|c| c.id.as_str()).collect::<Vec<_>>()
        );

        let raw = self.provider.complete(&prompt).await?;

        let reply: RefinerReply =
            serde_json::from_str(raw.trim()).map_err(|e| ClassifierError::RefinementParse {
                message: e.to_string(),
                raw: raw.clone(),
            })?;

        let mut mapped_categories = reply.mapped_techniques;
        if mapped_categories.len() > MAX_MAPPED_CATEGORIES {
            warn!(
                "Model mapped {} categories, truncating to {MAX_MAPPED_CATEGORIES}",
                mapped_categories.len()
            );
            mapped_categories.truncate(MAX_MAPPED_CATEGORIES);
        }

        for id in &mapped_categories {
            if !candidates.iter().any(|c| &c.id == id) {
                warn!("Model mapped id outside the candidate shortlist: {id}");
            }
        }

        Ok(ClassificationResult {
            mapped_categories,
            reasoning: reply.reasoning,
            confidence: reply.confidence,
        })
    }
}

/// Build the constrained refinement prompt.
fn build_prompt(document_text: &str, candidates: &[Category]) -> Result<String> {
    let candidates_json = serde_json::to_string_pretty(candidates)?;

    Ok(format!(
        r#"Given the following ICS security advisory, identify which of the candidate MITRE ATT&CK techniques apply. Consider the vulnerabilities, attack vectors, and potential impacts described.

Advisory content:
{document_text}

Candidate techniques (JSON):
{candidates_json}

Respond with strictly a JSON object and nothing else - no prose, no markdown fencing:
{{"mapped_techniques": [up to 3 technique ids from the candidates above, most relevant first], "reasoning": {{technique id: brief explanation}}, "confidence": "high" | "medium" | "low"}}

Use only technique ids that appear in the candidates. If none apply, return an empty mapped_techniques array."#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Returns a scripted reply and records the prompt it saw.
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

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
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

    fn candidates(ids: &[&str]) -> Vec<Category> {
        ids.iter()
            .map(|id| Category {
                id: id.to_string(),
                name: format!("Technique {id}"),
                description: "test technique".to_string(),
                tactics: vec!["impact".to_string()],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_refine_parses_mapping() {
        let provider = ScriptedProvider::new(
            r#"{"mapped_techniques": ["T1"], "reasoning": {"T1": "matches the described spoofing"}, "confidence": "high"}"#,
        );
        let refiner = Refiner::new(provider);

        let result = refiner
            .refine("advisory text", &candidates(&["T1", "T2"]))
            .await
            .unwrap();

        assert_eq!(result.mapped_categories, vec!["T1".to_string()]);
        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(
            result.reasoning.get("T1").map(String::as_str),
            Some("matches the described spoofing")
        );
    }

    #[tokio::test]
    async fn test_refine_malformed_reply_is_parse_error() {
        let provider = ScriptedProvider::new("not json");
        let refiner = Refiner::new(provider);

        let err = refiner
            .refine("advisory text", &candidates(&["T1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifierError::RefinementParse { .. }));
    }

    #[tokio::test]
    async fn test_refine_missing_array_is_parse_error() {
        let provider = ScriptedProvider::new(r#"{"confidence": "low"}"#);
        let refiner = Refiner::new(provider);

        let err = refiner
            .refine("advisory text", &candidates(&["T1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifierError::RefinementParse { .. }));
    }

    #[tokio::test]
    async fn test_refine_truncates_to_three() {
        let provider = ScriptedProvider::new(
            r#"{"mapped_techniques": ["T1", "T2", "T3", "T4"], "confidence": "medium"}"#,
        );
        let refiner = Refiner::new(provider);

        let result = refiner
            .refine("advisory text", &candidates(&["T1", "T2", "T3", "T4"]))
            .await
            .unwrap();

        assert_eq!(result.mapped_categories.len(), 3);
        assert_eq!(result.mapped_categories, vec!["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn test_refine_defaults_confidence_to_unknown() {
        let provider = ScriptedProvider::new(r#"{"mapped_techniques": []}"#);
        let refiner = Refiner::new(provider);

        let result = refiner
            .refine("advisory text", &candidates(&["T1"]))
            .await
            .unwrap();

        assert!(result.mapped_categories.is_empty());
        assert_eq!(result.confidence, Confidence::Unknown);
    }

    #[tokio::test]
    async fn test_prompt_embeds_only_the_shortlist() {
        let provider = ScriptedProvider::new(r#"{"mapped_techniques": []}"#);
        let refiner = Refiner::new(provider);

        refiner
            .refine("the advisory body", &candidates(&["T7"]))
            .await
            .unwrap();

        let prompt = refiner.provider().last_prompt();
        assert!(prompt.contains("the advisory body"));
        assert!(prompt.contains("\"T7\""));
        assert!(!prompt.contains("\"T1\""));
    }
}
