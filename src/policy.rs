//! Retention policy — the deterministic early-exit gate that runs before any
//! content extraction or model call.
//!
//! The age check is evaluated strictly before the type check: a file that is
//! both past retention and an unsupported type is always DESTROY, never SKIP.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Local};

/// Document formats the extractor can read.
pub const INCLUDE_EXT: &[&str] = &[
    ".txt", ".csv", ".docx", ".xlsx", ".pptx", ".pdf", ".html", ".htm", ".md",
    ".rtf", ".odt", ".xml", ".json", ".yaml", ".yml", ".log", ".tsv",
];

/// Binary/archive/executable types never worth classifying.
pub const EXCLUDE_EXT: &[&str] = &[
    ".tmp", ".bak", ".old", ".zip", ".rar", ".tar", ".gz", ".7z",
    ".exe", ".dll", ".sys", ".iso", ".dmg", ".apk", ".msi", ".ps1", ".psd1",
    ".psm1", ".db", ".mdb", ".accdb",
];

/// Outcome of the retention gate for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionDecision {
    /// Past the retention threshold — authoritative, overrides everything.
    Destroy,
    /// Excluded or unsupported type; the reason string is user-facing.
    Skip(String),
    /// Within retention and a supported format — continue the pipeline.
    Proceed,
}

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    destroy_threshold_years: i64,
    include_ext: HashSet<String>,
    exclude_ext: HashSet<String>,
}

impl RetentionPolicy {
    pub fn new(destroy_threshold_years: i64) -> Self {
        Self {
            destroy_threshold_years,
            include_ext: INCLUDE_EXT.iter().map(|s| s.to_string()).collect(),
            exclude_ext: EXCLUDE_EXT.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn threshold_years(&self) -> i64 {
        self.destroy_threshold_years
    }

    /// The cutoff instant: anything modified before this is destroy-eligible.
    pub fn threshold(&self, now: DateTime<Local>) -> DateTime<Local> {
        now - Duration::days(self.destroy_threshold_years * 365)
    }

    /// Is the file past the retention threshold as of `now`?
    pub fn past_threshold(&self, last_modified: DateTime<Local>, now: DateTime<Local>) -> bool {
        last_modified < self.threshold(now)
    }

    /// Age check first, then exclusion set, then inclusion allow-list.
    pub fn decide(
        &self,
        last_modified: DateTime<Local>,
        extension: &str,
        now: DateTime<Local>,
    ) -> RetentionDecision {
        if self.past_threshold(last_modified, now) {
            return RetentionDecision::Destroy;
        }
        if self.exclude_ext.contains(extension) {
            return RetentionDecision::Skip(format!("Excluded file type: {extension}"));
        }
        if !self.include_ext.contains(extension) {
            return RetentionDecision::Skip(format!("Unsupported file type: {extension}"));
        }
        RetentionDecision::Proceed
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years_ago(years: i64) -> DateTime<Local> {
        Local::now() - Duration::days(years * 365 + 30)
    }

    #[test]
    fn old_file_is_destroy() {
        let policy = RetentionPolicy::default();
        let decision = policy.decide(years_ago(7), ".txt", Local::now());
        assert_eq!(decision, RetentionDecision::Destroy);
    }

    #[test]
    fn age_check_beats_type_check() {
        // Old AND excluded: DESTROY wins, never SKIP.
        let policy = RetentionPolicy::default();
        let decision = policy.decide(years_ago(10), ".exe", Local::now());
        assert_eq!(decision, RetentionDecision::Destroy);
    }

    #[test]
    fn excluded_extension_is_skip() {
        let policy = RetentionPolicy::default();
        match policy.decide(Local::now(), ".exe", Local::now()) {
            RetentionDecision::Skip(reason) => assert!(reason.contains(".exe")),
            other => panic!("expected Skip, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extension_is_skip() {
        let policy = RetentionPolicy::default();
        match policy.decide(Local::now(), ".xyz", Local::now()) {
            RetentionDecision::Skip(reason) => assert!(reason.contains("Unsupported")),
            other => panic!("expected Skip, got {other:?}"),
        }
    }

    #[test]
    fn supported_recent_file_proceeds() {
        let policy = RetentionPolicy::default();
        let decision = policy.decide(Local::now(), ".pdf", Local::now());
        assert_eq!(decision, RetentionDecision::Proceed);
    }

    #[test]
    fn threshold_is_configurable() {
        let policy = RetentionPolicy::new(2);
        assert_eq!(
            policy.decide(years_ago(3), ".txt", Local::now()),
            RetentionDecision::Destroy
        );
        let lenient = RetentionPolicy::new(10);
        assert_eq!(
            lenient.decide(years_ago(3), ".txt", Local::now()),
            RetentionDecision::Proceed
        );
    }

    #[test]
    fn boundary_just_inside_retention_proceeds() {
        let policy = RetentionPolicy::default();
        let now = Local::now();
        let just_inside = now - Duration::days(6 * 365 - 1);
        assert_eq!(
            policy.decide(just_inside, ".txt", now),
            RetentionDecision::Proceed
        );
    }

    #[test]
    fn extension_sets_are_disjoint() {
        let include: HashSet<_> = INCLUDE_EXT.iter().collect();
        let exclude: HashSet<_> = EXCLUDE_EXT.iter().collect();
        assert!(include.is_disjoint(&exclude));
    }
}
