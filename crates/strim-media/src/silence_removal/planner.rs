//! Turns detected boundaries into a trim decision.
//!
//! Padding widens the kept region on each side, and each side is gated on its
//! own against the minimum silence duration: a short leading silence never
//! blocks trimming a long trailing one.

use strim_models::{TrimDecision, TrimWindow};

use super::config::TrimPolicy;

/// Plan the trim for a buffer of `frame_count` frames.
///
/// `bounds` are the first and last non-silent frames from
/// [`detect`](super::detector::detect). The kept window is half-open and
/// includes the last non-silent frame, so with zero padding it spans exactly
/// `first..=last`.
pub fn plan(
    frame_count: usize,
    sample_rate: u32,
    bounds: Option<(usize, usize)>,
    policy: &TrimPolicy,
) -> TrimDecision {
    let Some((first, last)) = bounds else {
        return TrimDecision::unchanged(frame_count);
    };
    if sample_rate == 0 || first > last || last >= frame_count {
        return TrimDecision::unchanged(frame_count);
    }

    let padding = policy.padding_frames as usize;
    let rate = f64::from(sample_rate);

    let start_trimmed_seconds = if policy.trim_start {
        first as f64 / rate
    } else {
        0.0
    };
    let end_trimmed_seconds = if policy.trim_end {
        (frame_count - last) as f64 / rate
    } else {
        0.0
    };

    let trim_start_applied =
        policy.trim_start && start_trimmed_seconds >= policy.min_silence_seconds;
    let trim_end_applied = policy.trim_end && end_trimmed_seconds >= policy.min_silence_seconds;

    let start_index = if trim_start_applied {
        first.saturating_sub(padding)
    } else {
        0
    };
    let end_index = if trim_end_applied {
        last.saturating_add(1).saturating_add(padding).min(frame_count)
    } else {
        frame_count
    };

    let window =
        TrimWindow::new(start_index, end_index).unwrap_or_else(|_| TrimWindow::full(frame_count));

    TrimDecision {
        trim_start_applied,
        trim_end_applied,
        window,
        start_trimmed_seconds,
        end_trimmed_seconds,
    }
}
