//! CSV results sink — the stable export contract.
//!
//! One row per file, written in completion order and flushed after every
//! row so a killed run still leaves a readable report behind.

use std::fs::File;
use std::path::Path;

use thiserror::Error;

use crate::pipeline::ClassificationResult;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Could not create report at {path}: {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write report row: {0}")]
    Write(#[from] csv::Error),

    #[error("Failed to flush report: {0}")]
    Flush(#[from] std::io::Error),
}

/// Column order is the export contract; downstream tooling indexes by name.
const HEADER: [&str; 10] = [
    "FileName",
    "Extension",
    "FullPath",
    "LastModified",
    "SizeKB",
    "ModelDetermination",
    "ConfidenceScore",
    "ContextualInsights",
    "Status",
    "ProcessingTimeMs",
];

pub struct CsvSink {
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path).map_err(|source| ReportError::Create {
            path: path.display().to_string(),
            source,
        })?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Append one result row and flush it to disk.
    pub fn write(&mut self, result: &ClassificationResult) -> Result<(), ReportError> {
        let modified = result.last_modified.to_rfc3339();
        let size_kb = format!("{:.2}", result.size_kb);
        let confidence = result.confidence.to_string();
        let insights = insights(result);
        let elapsed = result.processing_time_ms.to_string();
        self.writer.write_record([
            result.file_name.as_str(),
            result.extension.as_str(),
            result.full_path.as_str(),
            modified.as_str(),
            size_kb.as_str(),
            result.label.as_str(),
            confidence.as_str(),
            insights.as_str(),
            result.status.as_str(),
            elapsed.as_str(),
        ])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }
}

/// Rationale plus any validator diagnostic, in one reviewer-facing cell.
fn insights(result: &ClassificationResult) -> String {
    match &result.validation_error {
        Some(issues) => format!("{} | Validation: {}", result.rationale, issues),
        None => result.rationale.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileRecord;
    use crate::taxonomy::{RecordLabel, ResultStatus};
    use chrono::Local;
    use std::path::PathBuf;

    fn sample_result() -> ClassificationResult {
        ClassificationResult {
            file_name: "memo.txt".into(),
            extension: ".txt".into(),
            full_path: "/data/memo.txt".into(),
            last_modified: Local::now(),
            size_kb: 1.5,
            label: RecordLabel::Keep,
            confidence: 90,
            raw_confidence: 90,
            rationale: "official record".into(),
            status: ResultStatus::Success,
            keywords_found: vec![],
            content: String::new(),
            validation_passed: true,
            validation_error: None,
            processing_time_ms: 12,
            seq: 0,
        }
    }

    #[test]
    fn header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.write(&sample_result()).unwrap();
        assert_eq!(sink.rows_written(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            HEADER.to_vec()
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "memo.txt");
        assert_eq!(&row[5], "KEEP");
        assert_eq!(&row[6], "90");
        assert_eq!(&row[8], "success");
    }

    #[test]
    fn rows_are_readable_before_sink_closes() {
        // Per-row flush: the file must be complete even mid-run.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = CsvSink::create(&path).unwrap();
        sink.write(&sample_result()).unwrap();

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk.lines().count(), 2);
        drop(sink);
    }

    #[test]
    fn validation_issues_land_in_insights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        let result = ClassificationResult {
            validation_error: Some("confidence mismatch: stored 40, recomputed 90".into()),
            ..sample_result()
        };
        sink.write(&result).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("official record | Validation: confidence mismatch"));
    }

    #[test]
    fn error_row_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut sink = CsvSink::create(&path).unwrap();

        let record = FileRecord {
            path: PathBuf::from("/data/bad.txt"),
            file_name: "bad.txt".into(),
            extension: ".txt".into(),
            size_bytes: 10,
            last_modified: Local::now(),
            seq: 1,
        };
        sink.write(&ClassificationResult::error(&record, "stage panicked"))
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[5], "ERROR");
        assert_eq!(&row[6], "0");
        assert_eq!(&row[7], "stage panicked");
        assert_eq!(&row[8], "error");
    }

    #[test]
    fn unwritable_path_is_create_error() {
        let result = CsvSink::create(Path::new("/nonexistent/dir/report.csv"));
        assert!(matches!(result, Err(ReportError::Create { .. })));
    }
}
