//! Shared data models for the strim silence trimmer.
//!
//! This crate provides Serde-serializable types for:
//! - In-memory audio buffers
//! - Trim windows and trim decisions
//! - Supported audio formats and their tag layouts
//! - Per-file tasks, outcomes and batch summaries

pub mod buffer;
pub mod format;
pub mod tags;
pub mod task;
pub mod trim;

// Re-export common types
pub use buffer::{AudioBuffer, BufferError, EncodingHints};
pub use format::{AudioFormat, TagLayout};
pub use tags::{Artwork, RiffChunk, TagSet};
pub use task::{display_name, BatchSummary, FailureKind, FileOutcome, FileTask, OutcomeStatus};
pub use trim::{InvalidWindow, TrimDecision, TrimWindow};
