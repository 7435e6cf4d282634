//! LLM-backed classifier: prompt construction, chat call, verdict parsing.

use std::sync::Arc;

use tracing::{info, warn};

use super::ollama::{GenerationOptions, LlmClient};
use super::parser::parse_model_verdict;
use super::{ClassificationOutcome, ClassifierBackend, ClassifyError};
use crate::scanner::FileRecord;
use crate::taxonomy::Taxonomy;

pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
    taxonomy: Arc<Taxonomy>,
    model: String,
    options: GenerationOptions,
    /// Result of the startup probe. When false every classify call returns
    /// ServiceUnavailable immediately instead of paying the connect timeout
    /// per file.
    available: bool,
}

impl LlmClassifier {
    /// Probes the service once at construction. An unreachable service or a
    /// missing model is logged and remembered, never fatal: the pipeline
    /// answers with the heuristic fallback per file.
    pub fn new(
        client: Arc<dyn LlmClient>,
        taxonomy: Arc<Taxonomy>,
        model: &str,
        temperature: f32,
    ) -> Self {
        let available = match client.list_models() {
            Ok(models) => {
                if models.iter().any(|m| m == model) {
                    info!(model, "model available");
                    true
                } else {
                    warn!(
                        model,
                        available = ?models,
                        "configured model not installed; falling back to heuristic"
                    );
                    false
                }
            }
            Err(e) => {
                warn!(error = %e, "classifier service unreachable; falling back to heuristic");
                false
            }
        };

        Self {
            client,
            taxonomy,
            model: model.to_string(),
            options: GenerationOptions::with_temperature(temperature),
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn build_prompt(&self, record: &FileRecord, content: &str) -> String {
        let mut prompt = String::with_capacity(content.len() + 1024);
        prompt.push_str(
            "You are a records-retention analyst. Classify the document below \
             against the records retention schedule.\n\n",
        );
        prompt.push_str("Categories:\n");
        for label in self.taxonomy.labels() {
            prompt.push_str(&format!(
                "- {}: typical signals include {}\n",
                label.as_str(),
                self.taxonomy.keywords(label).join(", ")
            ));
        }
        prompt.push_str(&format!(
            "\nFile name: {}\nFile type: {}\nLast modified: {}\n\nContent:\n{}\n\n",
            record.file_name,
            record.extension,
            record.last_modified.to_rfc3339(),
            content
        ));
        prompt.push_str(
            "Respond with a single JSON object and nothing else:\n\
             {\"classification\": \"TRANSITORY|KEEP|ARCHIVE|DESTROY\", \
             \"confidence\": <number between 0 and 1>, \
             \"rationale\": \"<one sentence>\"}",
        );
        prompt
    }
}

impl ClassifierBackend for LlmClassifier {
    fn classify(
        &self,
        record: &FileRecord,
        content: &str,
    ) -> Result<ClassificationOutcome, ClassifyError> {
        if !self.available {
            return Err(ClassifyError::ServiceUnavailable(self.model.clone()));
        }

        let prompt = self.build_prompt(record, content);
        let raw = self.client.chat(&self.model, &prompt, &self.options)?;
        let verdict = parse_model_verdict(&raw)?;

        Ok(ClassificationOutcome {
            keywords_found: self.taxonomy.keywords_found(verdict.label, content),
            label: verdict.label,
            confidence: verdict.confidence,
            rationale: verdict.rationale,
            used_fallback: false,
        })
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
