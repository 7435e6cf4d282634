//! Hybrid document classification against a records retention schedule.
//!
//! A directory scan feeds a per-file pipeline: retention policy gate,
//! content extraction, LLM classification with a deterministic heuristic
//! fallback, hybrid confidence scoring, and advisory validation. Every
//! discovered file yields exactly one result row.

pub mod classify;
pub mod confidence;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod taxonomy;
pub mod validate;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, defaulting to info for this crate.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
