//! Classifier backends and their shared contract.
//!
//! One engine, pluggable backends: the LLM-over-HTTP classifier and the
//! deterministic heuristic. The pipeline chains them — any LLM failure
//! (unreachable service, timeout, broken output contract) falls through to
//! the heuristic, which always succeeds.

pub mod heuristic;
pub mod llm;
pub mod ollama;
pub mod parser;

use thiserror::Error;

use crate::scanner::FileRecord;
use crate::taxonomy::RecordLabel;

/// Failures on the LLM path. All of these are recoverable: the pipeline
/// answers every one of them with the heuristic fallback.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classifier service is not reachable at {0}")]
    ServiceUnavailable(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("Service returned error (status {status}): {body}")]
    ServiceError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("No JSON object in model response: {0}")]
    NoJson(String),

    #[error("Model output violates contract: {0}")]
    OutputContract(String),
}

/// Raw result of either classifier, confidence already normalized to 0-100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationOutcome {
    pub label: RecordLabel,
    pub confidence: u8,
    pub rationale: String,
    /// True when the heuristic ran in place of a configured LLM.
    pub used_fallback: bool,
    /// Keywords of `label` observed in the content — audit evidence.
    pub keywords_found: Vec<String>,
}

/// A classification backend. Exactly one backend produces the outcome for
/// a given file; the pipeline handles chaining on failure.
pub trait ClassifierBackend: Send + Sync {
    fn classify(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> Result<ClassificationOutcome, ClassifyError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
