//! Batch driver — runs many files through the pipeline on a bounded worker
//! pool, funneling finished results to a single writer.
//!
//! Workers never share mutable state; finished results travel over a
//! channel to the caller's sink callback, which runs on the driver thread.
//! A panic inside one file's pipeline becomes that file's error row; it
//! never takes down the batch.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info};

use crate::pipeline::{ClassificationEngine, ClassificationResult};
use crate::report::ReportError;
use crate::scanner::FileRecord;
use crate::taxonomy::ResultStatus;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to build worker pool: {0}")]
    Pool(String),

    #[error(transparent)]
    Sink(#[from] ReportError),
}

/// Tallies for the end-of-run log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub errors: usize,
    pub fallbacks: usize,
    pub cancelled: bool,
}

/// Classify every record on `jobs` workers; `on_result` receives each
/// finished row on the calling thread, in completion order.
///
/// The cancel flag is checked before each file starts. In-flight files run
/// to completion; a set flag only stops new work.
pub fn run_batch<F>(
    engine: &ClassificationEngine,
    records: &[FileRecord],
    jobs: usize,
    cancel: &AtomicBool,
    mut on_result: F,
) -> Result<BatchStats, RunnerError>
where
    F: FnMut(ClassificationResult) -> Result<(), ReportError>,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| RunnerError::Pool(e.to_string()))?;
    info!(files = records.len(), workers = jobs, "Starting batch");

    let (tx, rx) = mpsc::channel::<ClassificationResult>();
    let mut stats = BatchStats::default();

    std::thread::scope(|scope| -> Result<(), RunnerError> {
        scope.spawn(move || {
            pool.install(|| {
                records.par_iter().for_each_with(tx, |tx, record| {
                    if cancel.load(Ordering::Relaxed) {
                        return;
                    }
                    let result =
                        catch_unwind(AssertUnwindSafe(|| engine.classify_file(record)))
                            .unwrap_or_else(|payload| {
                                let message = panic_message(payload.as_ref());
                                error!(file = %record.file_name, panic = %message, "pipeline panicked");
                                ClassificationResult::error(record, &message)
                            });
                    // Send fails only when the receiver gave up; the row is
                    // lost either way, so the error is dropped.
                    let _ = tx.send(result);
                });
            });
        });

        for result in rx {
            stats.processed += 1;
            match result.status {
                ResultStatus::Error => stats.errors += 1,
                ResultStatus::Fallback => stats.fallbacks += 1,
                _ => {}
            }
            on_result(result)?;
        }
        Ok(())
    })?;

    stats.cancelled = cancel.load(Ordering::Relaxed);
    info!(
        processed = stats.processed,
        errors = stats.errors,
        fallbacks = stats.fallbacks,
        cancelled = stats.cancelled,
        "Batch finished"
    );
    Ok(stats)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ollama::MockLlmClient;
    use crate::classify::ClassifyError;
    use crate::config::RunConfig;
    use crate::scanner::scan_directory;
    use std::sync::Arc;

    fn heuristic_engine() -> ClassificationEngine {
        ClassificationEngine::new(
            RunConfig::default(),
            Arc::new(MockLlmClient::failing(|| {
                ClassifyError::ServiceUnavailable("http://localhost:11434".into())
            })),
        )
    }

    #[test]
    fn one_row_per_file() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            std::fs::write(dir.path().join(format!("f{i}.txt")), "routine note").unwrap();
        }
        let records = scan_directory(dir.path()).unwrap();
        let engine = heuristic_engine();

        let mut rows = Vec::new();
        let cancel = AtomicBool::new(false);
        let stats = run_batch(&engine, &records, 4, &cancel, |r| {
            rows.push(r);
            Ok(())
        })
        .unwrap();

        assert_eq!(stats.processed, 8);
        assert_eq!(rows.len(), 8);
        assert!(!stats.cancelled);

        // Completion order is arbitrary; seq restores discovery order.
        rows.sort_by_key(|r| r.seq);
        let seqs: Vec<u64> = rows.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..8).collect::<Vec<u64>>());
    }

    #[test]
    fn preset_cancel_flag_stops_all_work() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let records = scan_directory(dir.path()).unwrap();
        let engine = heuristic_engine();

        let cancel = AtomicBool::new(true);
        let stats = run_batch(&engine, &records, 2, &cancel, |_| Ok(())).unwrap();
        assert_eq!(stats.processed, 0);
        assert!(stats.cancelled);
    }

    #[test]
    fn sink_failure_aborts_the_drain() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        let records = scan_directory(dir.path()).unwrap();
        let engine = heuristic_engine();

        let cancel = AtomicBool::new(false);
        let result = run_batch(&engine, &records, 1, &cancel, |_| {
            Err(ReportError::Flush(std::io::Error::other("disk full")))
        });
        assert!(matches!(result, Err(RunnerError::Sink(_))));
    }

    #[test]
    fn fallback_rows_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "routine").unwrap();
        std::fs::write(dir.path().join("b.exe"), "MZ").unwrap();
        let records = scan_directory(dir.path()).unwrap();
        let engine = heuristic_engine();

        let cancel = AtomicBool::new(false);
        let stats = run_batch(&engine, &records, 2, &cancel, |_| Ok(())).unwrap();
        assert_eq!(stats.processed, 2);
        // The .txt goes through the heuristic fallback; the .exe is a
        // terminal skip and does not count as a fallback.
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn panic_message_extracts_both_payload_shapes() {
        let p1 = catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(p1.as_ref()), "static message");

        let p2 = catch_unwind(|| panic!("{}", String::from("owned"))).unwrap_err();
        assert_eq!(panic_message(p2.as_ref()), "owned");
    }
}
