//! Leading/trailing silence trimming.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ AudioBuffer  │───►│ Detector     │───►│ Planner      │
//! │ (f32 frames) │    │ (first, last)│    │ (TrimWindow) │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌──────────────┐
//!                                         │ slice buffer │
//!                                         └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use strim_media::silence_removal::{trim_decision, TrimPolicy};
//!
//! let policy = TrimPolicy::default().with_padding_frames(16);
//! let decision = trim_decision(&buffer, &policy);
//! let trimmed = buffer.slice(decision.window);
//! ```

mod config;
mod detector;
mod planner;

pub use config::{
    TrimPolicy, DEFAULT_MIN_SILENCE_SECONDS, DEFAULT_NOISE_FLOOR_DB, DEFAULT_PADDING_FRAMES,
};
pub use detector::{db_to_amplitude, detect};
pub use planner::plan;

use strim_models::{AudioBuffer, TrimDecision};

/// Detect edge silence in `buffer` and plan the trim in one step.
pub fn trim_decision(buffer: &AudioBuffer, policy: &TrimPolicy) -> TrimDecision {
    let bounds = detect(buffer, policy.noise_floor_db);
    plan(buffer.frame_count(), buffer.sample_rate(), bounds, policy)
}
