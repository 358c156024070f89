//! Trim window and trim decision models.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for windows whose start lies after their end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid trim window: start {start} > end {end}")]
pub struct InvalidWindow {
    pub start: usize,
    pub end: usize,
}

/// Half-open frame range `[start_index, end_index)` that survives trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrimWindow {
    start_index: usize,
    end_index: usize,
}

impl TrimWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start_index: usize, end_index: usize) -> Result<Self, InvalidWindow> {
        if start_index > end_index {
            return Err(InvalidWindow {
                start: start_index,
                end: end_index,
            });
        }
        Ok(Self {
            start_index,
            end_index,
        })
    }

    /// Window covering a whole buffer of `frame_count` frames.
    pub fn full(frame_count: usize) -> Self {
        Self {
            start_index: 0,
            end_index: frame_count,
        }
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn end_index(&self) -> usize {
        self.end_index
    }

    /// Number of frames kept.
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// True when the window keeps every frame of a `frame_count` buffer.
    pub fn is_full(&self, frame_count: usize) -> bool {
        self.start_index == 0 && self.end_index >= frame_count
    }
}

/// Final per-file trimming decision.
///
/// `start_trimmed_seconds` / `end_trimmed_seconds` hold the measured silence
/// on each side, padding excluded. A side only counts as removed when its
/// `*_applied` flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimDecision {
    pub trim_start_applied: bool,
    pub trim_end_applied: bool,
    pub window: TrimWindow,
    pub start_trimmed_seconds: f64,
    pub end_trimmed_seconds: f64,
}

impl TrimDecision {
    /// Decision that keeps the whole buffer.
    pub fn unchanged(frame_count: usize) -> Self {
        Self {
            trim_start_applied: false,
            trim_end_applied: false,
            window: TrimWindow::full(frame_count),
            start_trimmed_seconds: 0.0,
            end_trimmed_seconds: 0.0,
        }
    }

    /// True when neither side is trimmed.
    pub fn is_noop(&self) -> bool {
        !self.trim_start_applied && !self.trim_end_applied
    }

    /// Seconds of silence actually removed (applied sides only).
    pub fn seconds_removed(&self) -> f64 {
        let start = if self.trim_start_applied {
            self.start_trimmed_seconds
        } else {
            0.0
        };
        let end = if self.trim_end_applied {
            self.end_trimmed_seconds
        } else {
            0.0
        };
        start + end
    }
}
