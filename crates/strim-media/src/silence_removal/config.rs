//! Configuration for silence trimming.
//!
//! These parameters control which edges are trimmed and how aggressively.
//! The defaults match the historical batch script: a -60 dB floor, 32 frames
//! of padding and a one second minimum.

use serde::{Deserialize, Serialize};

/// Default noise floor in dB.
pub const DEFAULT_NOISE_FLOOR_DB: f64 = -60.0;
/// Default padding kept around the detected edge, in frames.
pub const DEFAULT_PADDING_FRAMES: u32 = 32;
/// Default minimum silence duration worth trimming, in seconds.
pub const DEFAULT_MIN_SILENCE_SECONDS: f64 = 1.0;

/// Trimming policy applied by the detector and planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimPolicy {
    /// Amplitude threshold in dB (negative).
    ///
    /// - -40 dB: aggressive, quiet room tone counts as silence
    /// - -60 dB: default, only near-digital silence is trimmed
    /// - -80 dB: very conservative, dithered silence is kept
    pub noise_floor_db: f64,

    /// Frames kept on each side of the detected non-silent region.
    pub padding_frames: u32,

    /// A side is only trimmed when its silence lasts at least this long.
    pub min_silence_seconds: f64,

    /// Trim leading silence.
    pub trim_start: bool,

    /// Trim trailing silence.
    pub trim_end: bool,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            noise_floor_db: DEFAULT_NOISE_FLOOR_DB,
            padding_frames: DEFAULT_PADDING_FRAMES,
            min_silence_seconds: DEFAULT_MIN_SILENCE_SECONDS,
            trim_start: true,
            trim_end: true,
        }
    }
}

impl TrimPolicy {
    /// Builder-style setter for the noise floor.
    pub fn with_noise_floor_db(mut self, db: f64) -> Self {
        self.noise_floor_db = db;
        self
    }

    /// Builder-style setter for padding.
    pub fn with_padding_frames(mut self, frames: u32) -> Self {
        self.padding_frames = frames;
        self
    }

    /// Builder-style setter for the minimum silence duration.
    ///
    /// Negative values are clamped to zero.
    pub fn with_min_silence_seconds(mut self, seconds: f64) -> Self {
        self.min_silence_seconds = seconds.max(0.0);
        self
    }

    /// Builder-style setter for which edges are trimmed.
    pub fn with_edges(mut self, trim_start: bool, trim_end: bool) -> Self {
        self.trim_start = trim_start;
        self.trim_end = trim_end;
        self
    }

    /// Linear amplitude equivalent of the noise floor.
    pub fn epsilon(&self) -> f64 {
        super::detector::db_to_amplitude(self.noise_floor_db)
    }
}
