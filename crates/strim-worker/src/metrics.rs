//! Batch metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};
use strim_models::FileOutcome;

/// Metric names as constants for consistency.
pub mod names {
    pub const FILES_TOTAL: &str = "strim_files_total";
    pub const TRIMMED_SECONDS: &str = "strim_trimmed_seconds";
    pub const FILE_DURATION_SECONDS: &str = "strim_file_duration_seconds";
}

/// Record a finished file.
pub fn record_file_outcome(outcome: &FileOutcome) {
    let labels = [("status", outcome.status.as_str().to_string())];
    counter!(names::FILES_TOTAL, &labels).increment(1);

    histogram!(names::FILE_DURATION_SECONDS).record(outcome.elapsed_ms as f64 / 1000.0);

    if let Some(decision) = outcome.decision() {
        histogram!(names::TRIMMED_SECONDS).record(decision.seconds_removed());
    }
}
