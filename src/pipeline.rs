//! Pipeline orchestrator — drives one file from discovery to a finalized
//! result record.
//!
//! Stage order: retention gate (may terminate early), content extraction,
//! classification (LLM chained to heuristic), hybrid confidence, validation.
//! `classify_file` is total: every call yields exactly one finalized result,
//! whatever happens in between.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::classify::heuristic::HeuristicClassifier;
use crate::classify::llm::LlmClassifier;
use crate::classify::ollama::LlmClient;
use crate::classify::{ClassificationOutcome, ClassifierBackend};
use crate::confidence::hybrid_confidence;
use crate::config::{RunConfig, RunMode};
use crate::extract::extract_content;
use crate::policy::{RetentionDecision, RetentionPolicy};
use crate::scanner::FileRecord;
use crate::taxonomy::{RecordLabel, ResultStatus, Taxonomy};
use crate::validate::Validator;

/// Confidence at or above which a result counts as validated.
pub const VALIDATION_CONFIDENCE_FLOOR: u8 = 70;

/// Cap on the error message carried in an error row's rationale.
const ERROR_RATIONALE_MAX: usize = 200;

/// The final, externally-visible record for one file. Built exactly once,
/// never mutated afterward.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub file_name: String,
    pub extension: String,
    pub full_path: String,
    pub last_modified: DateTime<Local>,
    pub size_kb: f64,
    pub label: RecordLabel,
    /// Hybrid confidence, always an integer in [0, 100].
    pub confidence: u8,
    /// Confidence as the classifier reported it, before policy adjustment.
    pub raw_confidence: u8,
    pub rationale: String,
    pub status: ResultStatus,
    pub keywords_found: Vec<String>,
    /// Extracted content the verdict was based on; kept for the validator's
    /// recomputation and not exported.
    pub content: String,
    pub validation_passed: bool,
    pub validation_error: Option<String>,
    pub processing_time_ms: u64,
    /// Discovery sequence number, the stable sort key for output.
    pub seq: u64,
}

impl ClassificationResult {
    /// Terminal error row for a file whose pipeline failed. Used by the
    /// batch driver as the catch-all for panics as well.
    pub fn error(record: &FileRecord, message: &str) -> Self {
        let rationale: String = message.chars().take(ERROR_RATIONALE_MAX).collect();
        Self {
            file_name: record.file_name.clone(),
            extension: record.extension.clone(),
            full_path: record.path.display().to_string(),
            last_modified: record.last_modified,
            size_kb: record.size_kb(),
            label: RecordLabel::Error,
            confidence: 0,
            raw_confidence: 0,
            rationale,
            status: ResultStatus::Error,
            keywords_found: vec![],
            content: String::new(),
            validation_passed: false,
            validation_error: None,
            processing_time_ms: 0,
            seq: record.seq,
        }
    }
}

pub struct ClassificationEngine {
    policy: RetentionPolicy,
    llm: Option<LlmClassifier>,
    heuristic: HeuristicClassifier,
    validator: Validator,
    config: RunConfig,
}

impl ClassificationEngine {
    /// Wires the backends from configuration. With `skip_analysis` set no
    /// LLM classifier is constructed at all and the heuristic is the primary
    /// backend rather than a fallback.
    pub fn new(config: RunConfig, client: Arc<dyn LlmClient>) -> Self {
        let taxonomy = Arc::new(Taxonomy::schedule_6());
        let policy = RetentionPolicy::new(config.destroy_threshold_years);

        let llm = if config.skip_analysis {
            None
        } else {
            Some(LlmClassifier::new(
                Arc::clone(&client),
                Arc::clone(&taxonomy),
                &config.model,
                config.temperature,
            ))
        };
        let heuristic =
            HeuristicClassifier::new(Arc::clone(&taxonomy), !config.skip_analysis);
        let validator = Validator::new(Arc::clone(&taxonomy), policy.clone());

        Self {
            policy,
            llm,
            heuristic,
            validator,
            config,
        }
    }

    /// Run one file through the pipeline. Total: always returns a finalized
    /// result with a non-empty status.
    pub fn classify_file(&self, record: &FileRecord) -> ClassificationResult {
        let started = Instant::now();
        let now = Local::now();

        let mut result = match self.config.run_mode {
            RunMode::LastModified => self.age_only(record, now),
            RunMode::Classification => match self.policy.decide(
                record.last_modified,
                &record.extension,
                now,
            ) {
                RetentionDecision::Destroy => self.terminal_destroy(record),
                RetentionDecision::Skip(reason) => self.terminal_skip(record, reason),
                RetentionDecision::Proceed => self.classify_content(record, now),
            },
        };

        result.processing_time_ms = started.elapsed().as_millis() as u64;
        let report = self.validator.validate(&result, now);
        result.validation_error = report.into_message();
        if let Some(ref msg) = result.validation_error {
            warn!(file = %result.file_name, issues = %msg, "validation flagged result");
        }
        debug!(
            file = %result.file_name,
            label = %result.label,
            confidence = result.confidence,
            status = %result.status,
            "finalized"
        );
        result
    }

    /// Age-only run mode: retention verdict from the timestamp alone, no
    /// extraction or classification.
    fn age_only(&self, record: &FileRecord, now: DateTime<Local>) -> ClassificationResult {
        if self.policy.past_threshold(record.last_modified, now) {
            self.terminal_destroy(record)
        } else {
            self.terminal_skip(
                record,
                format!(
                    "File newer than {} years",
                    self.policy.threshold_years()
                ),
            )
        }
    }

    fn terminal_destroy(&self, record: &FileRecord) -> ClassificationResult {
        self.finalize(
            record,
            RecordLabel::Destroy,
            100,
            100,
            format!(
                "Older than {} years - automatic destroy",
                self.policy.threshold_years()
            ),
            ResultStatus::DestroyAuto,
            vec![],
            String::new(),
        )
    }

    fn terminal_skip(&self, record: &FileRecord, reason: String) -> ClassificationResult {
        self.finalize(
            record,
            RecordLabel::Skip,
            100,
            100,
            reason,
            ResultStatus::Skipped,
            vec![],
            String::new(),
        )
    }

    /// The normal path: extract, classify (chaining to the heuristic on any
    /// LLM failure), score.
    fn classify_content(
        &self,
        record: &FileRecord,
        now: DateTime<Local>,
    ) -> ClassificationResult {
        let content = extract_content(&record.path, &record.extension, self.config.max_words);

        let (outcome, status) = self.run_backends(record, &content);
        let confidence = hybrid_confidence(
            outcome.label,
            outcome.confidence,
            &content,
            record.last_modified,
            &self.policy,
            now,
        );

        self.finalize(
            record,
            outcome.label,
            confidence,
            outcome.confidence,
            outcome.rationale,
            status,
            outcome.keywords_found,
            content,
        )
    }

    /// Exactly one backend produces the outcome. The heuristic never fails.
    fn run_backends(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> (ClassificationOutcome, ResultStatus) {
        if let Some(ref llm) = self.llm {
            match llm.classify(record, content) {
                Ok(outcome) => return (outcome, ResultStatus::Success),
                Err(e) => {
                    warn!(
                        file = %record.file_name,
                        error = %e,
                        "model path failed, using heuristic"
                    );
                }
            }
        }
        let outcome = self
            .heuristic
            .classify(record, content)
            .unwrap_or_else(|_| unreachable!("heuristic classifier is infallible"));
        let status = if outcome.used_fallback {
            ResultStatus::Fallback
        } else {
            ResultStatus::Success
        };
        (outcome, status)
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize(
        &self,
        record: &FileRecord,
        label: RecordLabel,
        confidence: u8,
        raw_confidence: u8,
        rationale: String,
        status: ResultStatus,
        keywords_found: Vec<String>,
        content: String,
    ) -> ClassificationResult {
        ClassificationResult {
            file_name: record.file_name.clone(),
            extension: record.extension.clone(),
            full_path: record.path.display().to_string(),
            last_modified: record.last_modified,
            size_kb: record.size_kb(),
            label,
            confidence,
            raw_confidence,
            rationale,
            status,
            keywords_found,
            content,
            validation_passed: confidence >= VALIDATION_CONFIDENCE_FLOOR,
            validation_error: None,
            processing_time_ms: 0,
            seq: record.seq,
        }
    }
}
