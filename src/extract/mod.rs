//! Bounded content extraction from heterogeneous document formats.
//!
//! Extraction never fails the pipeline: a corrupt document, a missing text
//! layer, or an unreadable encoding yields a short bracketed diagnostic
//! string that downstream stages treat as ordinary low-signal content. A
//! broken file must not abort a multi-thousand-file batch.

pub mod office;
pub mod pdf;
pub mod text;

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Raw text cap applied inside the format readers, before word truncation.
/// Keeps a pathological document from ballooning memory on a worker.
pub(crate) const MAX_RAW_CHARS: usize = 100_000;

/// Internal extraction failures. These never escape `extract_content`;
/// they become diagnostic content strings.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing error: {0}")]
    PdfParsing(String),

    #[error("No text layer in PDF and OCR is not available")]
    NoTextLayer,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Workbook error: {0}")]
    Workbook(String),
}

/// Extract up to `max_words` of whitespace-normalized text from `path`.
///
/// Dispatches on the lowercased `extension` (leading dot included). Total:
/// every failure path returns a bracketed diagnostic instead of an error.
pub fn extract_content(path: &Path, extension: &str, max_words: usize) -> String {
    let raw = match extension {
        ".txt" | ".md" | ".csv" | ".tsv" | ".log" | ".json" | ".xml" | ".yaml" | ".yml"
        | ".html" | ".htm" | ".rtf" => text::read_text_file(path),
        ".pdf" => pdf::extract_pdf(path),
        ".docx" => office::extract_docx(path),
        ".pptx" => office::extract_pptx(path),
        ".xlsx" => office::extract_xlsx(path),
        ".odt" => office::extract_odt(path),
        other => {
            return format!("[Unsupported file type: {other}]");
        }
    };

    match raw {
        Ok(text) => truncate_words(&clean_text(&text), max_words),
        Err(ExtractError::NoTextLayer) => {
            tracing::debug!(path = %path.display(), "PDF has no extractable text");
            "[Could not extract text from PDF: OCR not available]".into()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Extraction degraded");
            format!("[Error reading file: {e}]")
        }
    }
}

/// Collapse whitespace runs and unify line terminators.
pub fn clean_text(text: &str) -> String {
    static LINE_RUNS: OnceLock<Regex> = OnceLock::new();
    static SPACE_RUNS: OnceLock<Regex> = OnceLock::new();
    let lines = LINE_RUNS.get_or_init(|| Regex::new(r"[\r\n]+").expect("static regex"));
    let spaces = SPACE_RUNS.get_or_init(|| Regex::new(r"[ \t]+").expect("static regex"));

    let text = lines.replace_all(text, "\n");
    let text = spaces.replace_all(&text, " ");
    text.trim().to_string()
}

/// Keep the first `max_words` whitespace-separated words.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let mut out = String::new();
    for (i, word) in words.by_ref().take(max_words).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn plain_text_is_normalized_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "alpha   beta\r\n\r\ngamma\tdelta epsilon").unwrap();

        let content = extract_content(&path, ".txt", 3);
        assert_eq!(content, "alpha beta gamma");
    }

    #[test]
    fn missing_file_yields_diagnostic_content() {
        let content = extract_content(Path::new("/no/such/file.txt"), ".txt", 100);
        assert!(content.starts_with("[Error reading file:"), "got: {content}");
    }

    #[test]
    fn unsupported_extension_yields_diagnostic() {
        let content = extract_content(Path::new("whatever.bin"), ".bin", 100);
        assert_eq!(content, "[Unsupported file type: .bin]");
    }

    #[test]
    fn clean_text_collapses_runs() {
        assert_eq!(clean_text("a  b\t\tc"), "a b c");
        assert_eq!(clean_text("a\r\n\r\nb\n\n\nc"), "a\nb\nc");
        assert_eq!(clean_text("   padded   "), "padded");
    }

    #[test]
    fn truncate_words_keeps_prefix() {
        assert_eq!(truncate_words("one two three four", 2), "one two");
        assert_eq!(truncate_words("one", 10), "one");
        assert_eq!(truncate_words("", 10), "");
    }

    #[test]
    fn corrupt_docx_yields_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        fs::write(&path, "this is not a zip archive").unwrap();

        let content = extract_content(&path, ".docx", 100);
        assert!(content.starts_with("[Error reading file:"), "got: {content}");
    }

    #[test]
    fn corrupt_pdf_yields_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, "not a pdf at all").unwrap();

        let content = extract_content(&path, ".pdf", 100);
        assert!(content.starts_with('['), "got: {content}");
    }
}
