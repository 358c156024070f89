//! Human-readable batch report.

use std::io::Write;

use strim_models::{display_name, BatchSummary, FileOutcome, OutcomeStatus};

/// One line describing what happened to a file.
pub fn status_line(outcome: &FileOutcome) -> String {
    let name = display_name(&outcome.source_path);
    match &outcome.status {
        OutcomeStatus::Success { decision } if decision.is_noop() => {
            format!("[ok] {name}: unchanged")
        }
        OutcomeStatus::Success { decision } => {
            let mut line = format!(
                "[ok] {name}: trimmed {:.3} s (start {:.3} s, end {:.3} s)",
                decision.seconds_removed(),
                if decision.trim_start_applied {
                    decision.start_trimmed_seconds
                } else {
                    0.0
                },
                if decision.trim_end_applied {
                    decision.end_trimmed_seconds
                } else {
                    0.0
                },
            );
            if let Some(output) = &outcome.output_path {
                line.push_str(&format!(" -> {}", output.display()));
            }
            line
        }
        OutcomeStatus::Skipped { reason } => format!("[skipped] {name}: {reason}"),
        OutcomeStatus::Failed { kind, message } => format!("[failed] {name} ({kind}): {message}"),
    }
}

/// Final summary line.
pub fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "Found {} files: {} succeeded, {} skipped, {} failed. {:.3} s of silence trimmed.",
        summary.found, summary.succeeded, summary.skipped, summary.failed, summary.seconds_trimmed
    )
}

/// Write per-file lines (sorted by path), the failures and the summary.
pub fn write_report<W: Write>(out: &mut W, outcomes: &[FileOutcome]) -> std::io::Result<BatchSummary> {
    let mut sorted: Vec<&FileOutcome> = outcomes.iter().collect();
    sorted.sort_by(|a, b| a.source_path.cmp(&b.source_path));

    for outcome in &sorted {
        writeln!(out, "{}", status_line(outcome))?;
    }

    let failures: Vec<&&FileOutcome> = sorted.iter().filter(|o| o.is_failed()).collect();
    if !failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed files:")?;
        for outcome in failures {
            if let OutcomeStatus::Failed { kind, message } = &outcome.status {
                writeln!(out, "  {} ({kind}): {message}", outcome.source_path.display())?;
            }
        }
    }

    let summary = BatchSummary::from_outcomes(outcomes);
    writeln!(out)?;
    writeln!(out, "{}", summary_line(&summary))?;
    Ok(summary)
}
