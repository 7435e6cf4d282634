//! Output validator — advisory cross-field checks on a finalized result.
//!
//! Failures never discard or re-run a classification; they attach a
//! diagnostic string for a human reviewer. The recomputation check guards
//! against confidence values drifting between stages.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::confidence::hybrid_confidence;
use crate::pipeline::{ClassificationResult, VALIDATION_CONFIDENCE_FLOOR};
use crate::policy::RetentionPolicy;
use crate::taxonomy::{RecordLabel, ResultStatus, Taxonomy};

/// Maximum allowed drift between the stored confidence and an independent
/// recomputation, on the 0-100 scale.
const RECOMPUTE_TOLERANCE: u8 = 1;

/// One descriptive reason per violated invariant; empty means pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    failures: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Collapse to the diagnostic string attached to the result, or `None`
    /// on a clean pass.
    pub fn into_message(self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(self.failures.join("; "))
        }
    }

    fn flag(&mut self, reason: String) {
        self.failures.push(reason);
    }
}

pub struct Validator {
    taxonomy: Arc<Taxonomy>,
    policy: RetentionPolicy,
}

impl Validator {
    pub fn new(taxonomy: Arc<Taxonomy>, policy: RetentionPolicy) -> Self {
        Self { taxonomy, policy }
    }

    pub fn validate(
        &self,
        result: &ClassificationResult,
        now: DateTime<Local>,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_structure(result, &mut report);
        self.check_recomputed_confidence(result, now, &mut report);
        self.check_label_membership(result, &mut report);
        self.check_keyword_evidence(result, &mut report);
        self.check_validation_flag(result, &mut report);

        report
    }

    /// Required fields present and cross-field status invariants hold.
    fn check_structure(&self, result: &ClassificationResult, report: &mut ValidationReport) {
        if result.confidence > 100 {
            report.flag(format!("confidence out of range: {}", result.confidence));
        }
        if result.rationale.trim().is_empty() {
            report.flag("rationale is empty".into());
        }
        match result.status {
            ResultStatus::DestroyAuto => {
                if result.label != RecordLabel::Destroy || result.confidence != 100 {
                    report.flag(format!(
                        "destroy-auto requires DESTROY/100, got {}/{}",
                        result.label, result.confidence
                    ));
                }
            }
            ResultStatus::Skipped => {
                if result.label != RecordLabel::Skip || result.confidence != 100 {
                    report.flag(format!(
                        "skipped requires SKIP/100, got {}/{}",
                        result.label, result.confidence
                    ));
                }
            }
            ResultStatus::Error => {
                if result.label != RecordLabel::Error || result.confidence != 0 {
                    report.flag(format!(
                        "error requires ERROR/0, got {}/{}",
                        result.label, result.confidence
                    ));
                }
            }
            ResultStatus::Success | ResultStatus::Fallback => {}
        }
    }

    /// Recompute the hybrid confidence from the stored inputs; anything past
    /// the tolerance means a stage mutated or miscomputed the score.
    fn check_recomputed_confidence(
        &self,
        result: &ClassificationResult,
        now: DateTime<Local>,
        report: &mut ValidationReport,
    ) {
        if !matches!(
            result.status,
            ResultStatus::Success | ResultStatus::Fallback
        ) {
            return;
        }
        let recomputed = hybrid_confidence(
            result.label,
            result.raw_confidence,
            &result.content,
            result.last_modified,
            &self.policy,
            now,
        );
        if recomputed.abs_diff(result.confidence) > RECOMPUTE_TOLERANCE {
            report.flag(format!(
                "confidence mismatch: stored {}, recomputed {}",
                result.confidence, recomputed
            ));
        }
    }

    /// Classified results must carry a label from the classifiable taxonomy.
    fn check_label_membership(
        &self,
        result: &ClassificationResult,
        report: &mut ValidationReport,
    ) {
        if matches!(
            result.status,
            ResultStatus::Success | ResultStatus::Fallback
        ) && !result.label.is_classifiable()
        {
            report.flag(format!("label {} is not classifiable", result.label));
        }
    }

    /// Evidence must be a subset of the label's canonical keyword set.
    fn check_keyword_evidence(
        &self,
        result: &ClassificationResult,
        report: &mut ValidationReport,
    ) {
        let canonical = self.taxonomy.keywords(result.label);
        for kw in &result.keywords_found {
            if !canonical.contains(kw) {
                report.flag(format!(
                    "keyword '{}' is not in the {} keyword set",
                    kw, result.label
                ));
            }
        }
    }

    /// `validation_passed` must agree with the confidence floor in both
    /// directions.
    fn check_validation_flag(
        &self,
        result: &ClassificationResult,
        report: &mut ValidationReport,
    ) {
        let expected = result.confidence >= VALIDATION_CONFIDENCE_FLOOR;
        if result.validation_passed != expected {
            report.flag(format!(
                "validation_passed={} inconsistent with confidence {}",
                result.validation_passed, result.confidence
            ));
        }
    }
}
