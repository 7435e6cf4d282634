//! Deterministic keyword-frequency classifier.
//!
//! The fallback when the LLM path is unavailable or breaks its output
//! contract, and the sole backend in heuristic-only mode. Pure: identical
//! content always yields the identical outcome, which reproducible audits
//! depend on.

use std::sync::Arc;

use super::{ClassificationOutcome, ClassifierBackend, ClassifyError};
use crate::scanner::FileRecord;
use crate::taxonomy::{RecordLabel, Taxonomy};

/// Confidence when no keyword matched at all.
const NO_MATCH_CONFIDENCE: u8 = 50;
/// Confidence formula: 50 + min(matches * 10, 40), bounded to [50, 90].
const MATCH_BASE: u32 = 50;
const MATCH_STEP: u32 = 10;
const MATCH_BONUS_CAP: u32 = 40;

pub struct HeuristicClassifier {
    taxonomy: Arc<Taxonomy>,
    /// Reported on the outcome: true when this backend stands in for a
    /// configured LLM, false when it was chosen by configuration.
    as_fallback: bool,
}

impl HeuristicClassifier {
    pub fn new(taxonomy: Arc<Taxonomy>, as_fallback: bool) -> Self {
        Self {
            taxonomy,
            as_fallback,
        }
    }
}

impl ClassifierBackend for HeuristicClassifier {
    fn classify(
        &self,
        _record: &FileRecord,
        content: &str,
    ) -> Result<ClassificationOutcome, ClassifyError> {
        let text = content.to_lowercase();

        // Total occurrence count per label; ties resolve to the earlier
        // label in taxonomy order (strictly-greater wins).
        let mut best: Option<(RecordLabel, u32)> = None;
        for label in self.taxonomy.labels() {
            let count: u32 = self
                .taxonomy
                .keywords(label)
                .iter()
                .map(|kw| count_occurrences(&text, kw))
                .sum();
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ if count == 0 => {}
                _ => best = Some((label, count)),
            }
        }

        let outcome = match best {
            None => {
                let sample: String = text.chars().take(50).collect();
                ClassificationOutcome {
                    label: RecordLabel::Transitory,
                    confidence: NO_MATCH_CONFIDENCE,
                    rationale: format!("No keywords found. Sample: '{sample}'"),
                    used_fallback: self.as_fallback,
                    keywords_found: vec![],
                }
            }
            Some((label, count)) => {
                let first_match = self
                    .taxonomy
                    .keywords(label)
                    .iter()
                    .find(|kw| text.contains(kw.as_str()))
                    .cloned()
                    .unwrap_or_default();
                let confidence = (MATCH_BASE + (count * MATCH_STEP).min(MATCH_BONUS_CAP)) as u8;
                ClassificationOutcome {
                    label,
                    confidence,
                    rationale: format!("Matched keyword '{first_match}'"),
                    used_fallback: self.as_fallback,
                    keywords_found: self.taxonomy.keywords_found(label, content),
                }
            }
        };

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// Non-overlapping substring occurrence count.
fn count_occurrences(haystack: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut rest = haystack;
    while let Some(pos) = rest.find(needle) {
        count += 1;
        rest = &rest[pos + needle.len()..];
    }
    count
}
