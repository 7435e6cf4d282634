//! File discovery — walks a directory tree and captures immutable per-file
//! metadata for the pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use walkdir::WalkDir;

use crate::policy::{RetentionDecision, RetentionPolicy};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory does not exist: {0}")]
    Missing(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Immutable per-file metadata captured once at scan time.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub file_name: String,
    /// Lowercased extension including the leading dot; empty if none.
    pub extension: String,
    pub size_bytes: u64,
    pub last_modified: DateTime<Local>,
    /// Discovery order — the stable sort key for consumers that need
    /// deterministic ordering (results arrive in completion order).
    pub seq: u64,
}

impl FileRecord {
    pub fn size_kb(&self) -> f64 {
        (self.size_bytes as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// Category counts logged before a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub destroy: usize,
    pub analyze: usize,
    pub skip: usize,
    pub total: usize,
}

/// Walk `dir` and return records for every regular file, in discovery order.
///
/// Hidden files and Office lock files (`~$...`) are ignored. A file whose
/// metadata cannot be read still yields a record (size 0, mtime = now) so
/// the batch emits exactly one row per file.
pub fn scan_directory(dir: &Path) -> Result<Vec<FileRecord>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::Missing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    tracing::info!(dir = %dir.display(), "Scanning directory");

    let mut records = Vec::new();
    let mut seq = 0u64;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.starts_with('.') || file_name.starts_with("~$") {
            continue;
        }

        let (size_bytes, last_modified) = match entry.metadata() {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .map(DateTime::<Local>::from)
                    .unwrap_or_else(|_| Local::now());
                (meta.len(), mtime)
            }
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Could not stat file");
                (0, Local::now())
            }
        };

        records.push(FileRecord {
            path: entry.path().to_path_buf(),
            extension: extension_of(entry.path()),
            file_name,
            size_bytes,
            last_modified,
            seq,
        });
        seq += 1;
    }

    tracing::info!(files = records.len(), "Scan complete");
    Ok(records)
}

/// Count records per retention category without running the pipeline.
pub fn summarize(records: &[FileRecord], policy: &RetentionPolicy) -> ScanSummary {
    let now = Local::now();
    let mut summary = ScanSummary::default();
    for record in records {
        match policy.decide(record.last_modified, &record.extension, now) {
            RetentionDecision::Destroy => summary.destroy += 1,
            RetentionDecision::Skip(_) => summary.skip += 1,
            RetentionDecision::Proceed => summary.analyze += 1,
        }
        summary.total += 1;
    }
    summary
}

/// Lowercased extension with leading dot, or empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
