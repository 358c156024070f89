//! Per-file tasks and their outcomes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::AudioFormat;
use crate::trim::TrimDecision;

/// One discovered audio file, consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTask {
    /// File to trim
    pub source_path: PathBuf,
    /// Where the trimmed audio is written (equal to `source_path` when replacing)
    pub destination: PathBuf,
    /// Format resolved from the extension
    pub format: Option<AudioFormat>,
    /// Set at discovery when the destination clashes with another task's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
}

impl FileTask {
    pub fn new(source_path: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let format = AudioFormat::from_path(&source_path);
        Self {
            source_path,
            destination: destination.into(),
            format,
            conflict: None,
        }
    }

    /// Mark the task as colliding with another task's destination.
    pub fn with_conflict(mut self, reason: impl Into<String>) -> Self {
        self.conflict = Some(reason.into());
        self
    }

    /// True when the output overwrites the source file.
    pub fn replaces_source(&self) -> bool {
        self.source_path == self.destination
    }

    /// File name used in log lines.
    pub fn display_name(&self) -> String {
        display_name(&self.source_path)
    }
}

/// Last path component as text, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Category of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Decode,
    Encode,
    Metadata,
    Io,
    Conflict,
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Decode => "decode",
            FailureKind::Encode => "encode",
            FailureKind::Metadata => "metadata",
            FailureKind::Io => "io",
            FailureKind::Conflict => "conflict",
            FailureKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success { decision: TrimDecision },
    Skipped { reason: String },
    Failed { kind: FailureKind, message: String },
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success { .. } => "success",
            OutcomeStatus::Skipped { .. } => "skipped",
            OutcomeStatus::Failed { .. } => "failed",
        }
    }
}

/// Immutable record of what happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source_path: PathBuf,
    pub status: OutcomeStatus,
    /// File written, `None` when nothing was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Wall-clock time spent on the file
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl FileOutcome {
    pub fn success(
        source_path: impl Into<PathBuf>,
        decision: TrimDecision,
        output_path: Option<PathBuf>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            status: OutcomeStatus::Success { decision },
            output_path,
            elapsed_ms: 0,
        }
    }

    pub fn skipped(source_path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            status: OutcomeStatus::Skipped {
                reason: reason.into(),
            },
            output_path: None,
            elapsed_ms: 0,
        }
    }

    pub fn failed(
        source_path: impl Into<PathBuf>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            status: OutcomeStatus::Failed {
                kind,
                message: message.into(),
            },
            output_path: None,
            elapsed_ms: 0,
        }
    }

    /// Record the output file (kept for failures that happen after the write).
    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, OutcomeStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    /// The trim decision for successful outcomes.
    pub fn decision(&self) -> Option<&TrimDecision> {
        match &self.status {
            OutcomeStatus::Success { decision } => Some(decision),
            _ => None,
        }
    }
}

/// Aggregate counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub found: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Seconds of silence removed across all successful files
    pub seconds_trimmed: f64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        outcomes.iter().fold(
            BatchSummary {
                found: outcomes.len(),
                ..Default::default()
            },
            |mut summary, outcome| {
                match &outcome.status {
                    OutcomeStatus::Success { decision } => {
                        summary.succeeded += 1;
                        summary.seconds_trimmed += decision.seconds_removed();
                    }
                    OutcomeStatus::Skipped { .. } => summary.skipped += 1,
                    OutcomeStatus::Failed { .. } => summary.failed += 1,
                }
                summary
            },
        )
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
