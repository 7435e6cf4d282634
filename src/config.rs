//! Run configuration consumed by the pipeline.
//!
//! Defaults live here; `RC_*` environment variables override them and CLI
//! flags override both (applied in `main`).

use std::env;

pub const APP_NAME: &str = "records-classifier";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", APP_NAME.replace('-', "_"))
}

/// How a batch run treats each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full pipeline: retention policy, extraction, classification.
    Classification,
    /// Retention age only: destroy-auto past threshold, skip otherwise.
    /// No extraction, no model calls.
    LastModified,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Ollama model identifier.
    pub model: String,
    /// Ollama service base URL.
    pub ollama_url: String,
    /// Hard deadline for one model call, in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature, clamped to [0, 1] before use.
    pub temperature: f32,
    /// Retention threshold in years; files older are destroy-auto.
    pub destroy_threshold_years: i64,
    /// Extracted content is truncated to this many words.
    pub max_words: usize,
    /// Worker pool size. 0 means one worker per available CPU core.
    pub jobs: usize,
    pub run_mode: RunMode,
    /// Heuristic-only: never probe or call the LLM service.
    pub skip_analysis: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "records-classifier-phi2:latest".into(),
            ollama_url: "http://localhost:11434".into(),
            timeout_secs: 60,
            temperature: 0.1,
            destroy_threshold_years: 6,
            max_words: 500,
            jobs: 0,
            run_mode: RunMode::Classification,
            skip_analysis: false,
        }
    }
}

impl RunConfig {
    /// Defaults overridden by `RC_MODEL`, `RC_OLLAMA_URL`, `RC_TIMEOUT_SECS`,
    /// `RC_DESTROY_THRESHOLD_YEARS`, `RC_MAX_WORDS`, `RC_JOBS`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(model) = env::var("RC_MODEL") {
            if !model.is_empty() {
                cfg.model = model;
            }
        }
        if let Ok(url) = env::var("RC_OLLAMA_URL") {
            if !url.is_empty() {
                cfg.ollama_url = url;
            }
        }
        override_parsed(&mut cfg.timeout_secs, "RC_TIMEOUT_SECS");
        override_parsed(&mut cfg.destroy_threshold_years, "RC_DESTROY_THRESHOLD_YEARS");
        override_parsed(&mut cfg.max_words, "RC_MAX_WORDS");
        override_parsed(&mut cfg.jobs, "RC_JOBS");
        cfg
    }

    /// Effective worker count for the batch pool.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

fn override_parsed<T: std::str::FromStr>(slot: &mut T, var: &str) {
    if let Ok(raw) = env::var(var) {
        match raw.parse() {
            Ok(v) => *slot = v,
            Err(_) => tracing::warn!(var, value = %raw, "Ignoring unparseable override"),
        }
    }
}
