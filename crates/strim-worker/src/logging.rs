//! Structured per-file logging utilities.
//!
//! Provides consistent, structured logging for file processing with
//! tracing spans and the file name as a field on every line.

use std::path::Path;

use strim_models::{display_name, TrimDecision};
use tracing::{error, info, warn, Span};

/// Per-file logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct FileLogger {
    file: String,
    operation: String,
}

impl FileLogger {
    /// Create a logger for `path` performing `operation` (e.g. "trim").
    pub fn new(path: &Path, operation: &str) -> Self {
        Self {
            file: display_name(path),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            file = %self.file,
            operation = %self.operation,
            "Started: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            file = %self.file,
            operation = %self.operation,
            "{}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            file = %self.file,
            operation = %self.operation,
            "Failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            file = %self.file,
            operation = %self.operation,
            "Completed: {}", message
        );
    }

    /// Log the human-readable status lines for a trim decision.
    pub fn log_decision(&self, decision: &TrimDecision, min_silence_seconds: f64) {
        for line in decision_messages(decision, min_silence_seconds) {
            info!(
                file = %self.file,
                operation = %self.operation,
                start_trimmed_secs = decision.start_trimmed_seconds,
                end_trimmed_secs = decision.end_trimmed_seconds,
                "{}", line
            );
        }
    }

    /// Create a tracing span for this file.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "file",
            file = %self.file,
            operation = %self.operation
        )
    }
}

/// Status lines describing what a decision does to each edge.
pub fn decision_messages(decision: &TrimDecision, min_silence_seconds: f64) -> Vec<String> {
    let mut lines = Vec::new();

    if decision.trim_start_applied {
        lines.push(format!(
            "Trimmed {:.3} s of leading silence",
            decision.start_trimmed_seconds
        ));
    } else if decision.start_trimmed_seconds > 0.0 {
        lines.push(format!(
            "Start silence duration ({:.3} s) is less than the minimum threshold ({} s)",
            decision.start_trimmed_seconds, min_silence_seconds
        ));
    }

    if decision.trim_end_applied {
        lines.push(format!(
            "Trimmed {:.3} s of trailing silence",
            decision.end_trimmed_seconds
        ));
    } else if decision.end_trimmed_seconds > 0.0 {
        lines.push(format!(
            "End silence duration ({:.3} s) is less than the minimum threshold ({} s)",
            decision.end_trimmed_seconds, min_silence_seconds
        ));
    }

    if lines.is_empty() {
        lines.push("No silence detected. File remains unchanged.".to_string());
    }

    lines
}
