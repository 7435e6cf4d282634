//! Hybrid confidence — deterministic post-processing of a classifier's raw
//! confidence against content and retention-age evidence.
//!
//! Total over all inputs and idempotent: feeding a hybrid score back in
//! yields the same score. Every result row carries both the raw and the
//! hybrid value so the adjustment is auditable.

use chrono::{DateTime, Local};

use crate::policy::RetentionPolicy;
use crate::taxonomy::RecordLabel;

/// Maximum hybrid confidence for a DESTROY verdict on a file still within
/// its retention period.
const DESTROY_WITHIN_RETENTION_CAP: u8 = 80;

/// Adjust a raw 0-100 confidence using what the pipeline itself knows.
///
/// Rules, in order:
/// 1. DESTROY past the retention threshold: 100 — policy makes it certain.
/// 2. DESTROY within retention: capped at 80, floored at 1. A DESTROY call
///    on a file not yet past retention must never look maximally certain.
/// 3. Empty (whitespace-only) content: 0 — there was no evidence to judge.
/// 4. Everything else: clamped to [1, 100].
pub fn hybrid_confidence(
    label: RecordLabel,
    raw: u8,
    content: &str,
    last_modified: DateTime<Local>,
    policy: &RetentionPolicy,
    now: DateTime<Local>,
) -> u8 {
    if label == RecordLabel::Destroy {
        if policy.past_threshold(last_modified, now) {
            return 100;
        }
        return raw.clamp(1, DESTROY_WITHIN_RETENTION_CAP);
    }

    if content.trim().is_empty() {
        return 0;
    }

    raw.clamp(1, 100)
}
