//! Classification taxonomy — the closed label and status alphabets plus the
//! Schedule 6 keyword table.
//!
//! The keyword table is process-wide read-only configuration: built once at
//! startup and injected into the components that need it (heuristic
//! classifier, validator), never a mutable global.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Final determination for a record.
///
/// `Keep`/`Transitory`/`Archive`/`Destroy` are the classifiable labels a
/// model or heuristic may emit. `Skip` and `Error` are terminal markers the
/// pipeline assigns itself — no classifier ever produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordLabel {
    Keep,
    Transitory,
    Archive,
    Destroy,
    Skip,
    Error,
}

impl RecordLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Transitory => "TRANSITORY",
            Self::Archive => "ARCHIVE",
            Self::Destroy => "DESTROY",
            Self::Skip => "SKIP",
            Self::Error => "ERROR",
        }
    }

    /// The labels a classifier is allowed to emit, in taxonomy order.
    /// This order is also the deterministic tie-break for the heuristic.
    pub const CLASSIFIABLE: [RecordLabel; 4] = [
        Self::Transitory,
        Self::Keep,
        Self::Archive,
        Self::Destroy,
    ];

    pub fn is_classifiable(&self) -> bool {
        Self::CLASSIFIABLE.contains(self)
    }
}

impl fmt::Display for RecordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KEEP" => Ok(Self::Keep),
            "TRANSITORY" => Ok(Self::Transitory),
            "ARCHIVE" => Ok(Self::Archive),
            "DESTROY" => Ok(Self::Destroy),
            "SKIP" => Ok(Self::Skip),
            "ERROR" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

/// Terminal status of a pipeline run for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultStatus {
    /// Classified normally (LLM, or heuristic chosen by configuration).
    Success,
    /// Terminal skip on file type.
    Skipped,
    /// Terminal destroy on retention age.
    DestroyAuto,
    /// Heuristic ran in place of a configured LLM.
    Fallback,
    /// The pipeline failed for this file; the batch continued.
    Error,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::DestroyAuto => "destroy-auto",
            Self::Fallback => "fallback",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table mapping each classifiable label to its canonical keyword
/// list. Shared read-only across all workers.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<(RecordLabel, Vec<String>)>,
}

impl Taxonomy {
    /// The Schedule 6 keyword table. TRANSITORY and KEEP carry the schedule
    /// wording; ARCHIVE and DESTROY round out the taxonomy.
    pub fn schedule_6() -> Self {
        let kw = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            entries: vec![
                (
                    RecordLabel::Transitory,
                    kw(&["transitory", "temporary", "short-term", "routine", "informal"]),
                ),
                (
                    RecordLabel::Keep,
                    kw(&["official", "permanent", "record", "retention", "archival"]),
                ),
                (
                    RecordLabel::Archive,
                    kw(&["archive", "historical", "superseded", "inactive", "closed"]),
                ),
                (
                    RecordLabel::Destroy,
                    kw(&["destroy", "dispose", "obsolete", "expired", "purge"]),
                ),
            ],
        }
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = RecordLabel> + '_ {
        self.entries.iter().map(|(l, _)| *l)
    }

    /// Canonical keyword list for a label. Empty for SKIP/ERROR.
    pub fn keywords(&self, label: RecordLabel) -> &[String] {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, kws)| kws.as_slice())
            .unwrap_or(&[])
    }

    /// Keywords of `label` that occur in the lowercased content — the
    /// evidence list attached to a result. Always a subset of the canonical
    /// list by construction.
    pub fn keywords_found(&self, label: RecordLabel, content: &str) -> Vec<String> {
        let text = content.to_lowercase();
        self.keywords(label)
            .iter()
            .filter(|kw| text.contains(kw.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::schedule_6()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips_through_str() {
        for label in [
            RecordLabel::Keep,
            RecordLabel::Transitory,
            RecordLabel::Archive,
            RecordLabel::Destroy,
            RecordLabel::Skip,
            RecordLabel::Error,
        ] {
            assert_eq!(label.as_str().parse::<RecordLabel>(), Ok(label));
        }
    }

    #[test]
    fn unknown_label_rejected() {
        assert!("OFFICIAL".parse::<RecordLabel>().is_err());
        assert!("keep".parse::<RecordLabel>().is_err());
    }

    #[test]
    fn classifiable_excludes_terminal_markers() {
        assert!(RecordLabel::Keep.is_classifiable());
        assert!(RecordLabel::Destroy.is_classifiable());
        assert!(!RecordLabel::Skip.is_classifiable());
        assert!(!RecordLabel::Error.is_classifiable());
    }

    #[test]
    fn status_strings_match_contract() {
        assert_eq!(ResultStatus::DestroyAuto.as_str(), "destroy-auto");
        assert_eq!(ResultStatus::Fallback.as_str(), "fallback");
        assert_eq!(ResultStatus::Success.as_str(), "success");
    }

    #[test]
    fn taxonomy_covers_all_classifiable_labels() {
        let tax = Taxonomy::schedule_6();
        for label in RecordLabel::CLASSIFIABLE {
            assert!(
                !tax.keywords(label).is_empty(),
                "{label} has no keywords"
            );
        }
    }

    #[test]
    fn terminal_labels_have_no_keywords() {
        let tax = Taxonomy::schedule_6();
        assert!(tax.keywords(RecordLabel::Skip).is_empty());
        assert!(tax.keywords(RecordLabel::Error).is_empty());
    }

    #[test]
    fn keywords_found_is_subset_of_canonical() {
        let tax = Taxonomy::schedule_6();
        let found = tax.keywords_found(
            RecordLabel::Transitory,
            "A ROUTINE note, quite informal, about nothing permanent.",
        );
        assert_eq!(found, vec!["routine".to_string(), "informal".to_string()]);
        for kw in &found {
            assert!(tax.keywords(RecordLabel::Transitory).contains(kw));
        }
    }

    #[test]
    fn label_serializes_uppercase() {
        let json = serde_json::to_string(&RecordLabel::Destroy).unwrap();
        assert_eq!(json, "\"DESTROY\"");
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ResultStatus::DestroyAuto).unwrap();
        assert_eq!(json, "\"destroy-auto\"");
    }
}
