//! Parsing the model's free-form text into a validated verdict.
//!
//! Model output is not guaranteed to be pure JSON — it routinely arrives
//! wrapped in Markdown fences or followed by commentary. A brace-matching
//! scan pulls out the first balanced `{...}` object; the object is then
//! held to a closed three-field contract. Nothing partially valid escapes.

use serde::Deserialize;

use super::ClassifyError;
use crate::taxonomy::RecordLabel;

/// A validated, normalized model verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelVerdict {
    pub label: RecordLabel,
    /// Normalized to the 0-100 integer scale.
    pub confidence: u8,
    pub rationale: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    classification: Option<String>,
    confidence: Option<f64>,
    score: Option<f64>,
    rationale: Option<String>,
}

/// Extract and validate the verdict from raw model text.
pub fn parse_model_verdict(raw: &str) -> Result<ModelVerdict, ClassifyError> {
    let json_str = first_json_object(raw)
        .ok_or_else(|| ClassifyError::NoJson(snippet(raw, 200)))?;

    let parsed: RawVerdict = serde_json::from_str(json_str)
        .map_err(|e| ClassifyError::OutputContract(format!("JSON parse failure: {e}")))?;

    let label_str = parsed
        .classification
        .ok_or_else(|| ClassifyError::OutputContract("missing field: classification".into()))?;
    let label: RecordLabel = label_str
        .parse()
        .ok()
        .filter(RecordLabel::is_classifiable)
        .ok_or_else(|| {
            ClassifyError::OutputContract(format!("invalid classification: {label_str}"))
        })?;

    // Two accepted confidence shapes: `confidence` on [0,1] (scaled) or
    // `score` on [1,100] (taken as-is).
    let confidence = match (parsed.confidence, parsed.score) {
        (Some(c), _) if (0.0..=1.0).contains(&c) => (c * 100.0).round() as u8,
        (Some(c), _) => {
            return Err(ClassifyError::OutputContract(format!(
                "confidence out of range [0,1]: {c}"
            )))
        }
        (None, Some(s)) if (1.0..=100.0).contains(&s) => s.round() as u8,
        (None, Some(s)) => {
            return Err(ClassifyError::OutputContract(format!(
                "score out of range [1,100]: {s}"
            )))
        }
        (None, None) => {
            return Err(ClassifyError::OutputContract(
                "missing field: confidence or score".into(),
            ))
        }
    };

    let rationale = parsed
        .rationale
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ClassifyError::OutputContract("missing or empty rationale".into()))?;

    Ok(ModelVerdict {
        label,
        confidence,
        rationale,
    })
}

/// First balanced `{...}` object in `text`, string-literal aware.
/// Non-greedy: stops at the brace that closes the first opening brace.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn snippet(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
