use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use records_classifier::classify::ollama::OllamaClient;
use records_classifier::config::{RunConfig, RunMode, APP_VERSION};
use records_classifier::pipeline::ClassificationEngine;
use records_classifier::policy::RetentionPolicy;
use records_classifier::report::CsvSink;
use records_classifier::runner::run_batch;
use records_classifier::scanner::{scan_directory, summarize};

/// Classify documents in a folder against a records retention schedule.
#[derive(Parser, Debug)]
#[command(name = "records-classifier", version = APP_VERSION)]
struct Cli {
    /// Folder to scan recursively.
    folder: PathBuf,

    /// Destination CSV report.
    #[arg(short, long, default_value = "classification_report.csv")]
    output: PathBuf,

    /// Ollama model identifier.
    #[arg(long)]
    model: Option<String>,

    /// Ollama service base URL.
    #[arg(long)]
    ollama_url: Option<String>,

    /// Per-call model timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Sampling temperature (clamped to [0, 1]).
    #[arg(long)]
    temperature: Option<f32>,

    /// Worker pool size; 0 means one worker per CPU core.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Retention threshold in years; older files are destroy-auto.
    #[arg(long)]
    destroy_threshold_years: Option<i64>,

    /// Word cap on extracted content.
    #[arg(long)]
    max_words: Option<usize>,

    /// Decide on file age alone; no extraction or model calls.
    #[arg(long)]
    last_modified_only: bool,

    /// Classify with the keyword heuristic only; never contact the model.
    #[arg(long)]
    skip_analysis: bool,
}

impl Cli {
    /// Env-derived defaults, overridden by whichever flags were given.
    fn into_config(self) -> (RunConfig, PathBuf, PathBuf) {
        let mut config = RunConfig::from_env();
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(url) = self.ollama_url {
            config.ollama_url = url;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(t) = self.temperature {
            config.temperature = t;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(years) = self.destroy_threshold_years {
            config.destroy_threshold_years = years;
        }
        if let Some(words) = self.max_words {
            config.max_words = words;
        }
        if self.last_modified_only {
            config.run_mode = RunMode::LastModified;
        }
        config.skip_analysis = self.skip_analysis;
        (config, self.folder, self.output)
    }
}

fn main() -> anyhow::Result<()> {
    records_classifier::init_tracing();

    let (config, folder, output) = Cli::parse().into_config();
    info!(version = APP_VERSION, folder = %folder.display(), "Starting run");

    let records = scan_directory(&folder).context("Directory scan failed")?;
    let summary = summarize(
        &records,
        &RetentionPolicy::new(config.destroy_threshold_years),
    );
    info!(
        total = summary.total,
        destroy = summary.destroy,
        analyze = summary.analyze,
        skip = summary.skip,
        "Scan summary"
    );

    let cancel = AtomicBool::new(false);
    let jobs = config.effective_jobs();
    let client = Arc::new(OllamaClient::new(&config.ollama_url, config.timeout_secs));
    let engine = ClassificationEngine::new(config, client);

    let mut sink = CsvSink::create(&output).context("Could not open report")?;
    let stats = run_batch(&engine, &records, jobs, &cancel, |result| {
        sink.write(&result)
    })?;

    info!(
        report = %output.display(),
        rows = sink.rows_written(),
        errors = stats.errors,
        fallbacks = stats.fallbacks,
        "Run complete"
    );
    if stats.cancelled {
        info!("Run was cancelled; report is partial");
    }
    Ok(())
}
