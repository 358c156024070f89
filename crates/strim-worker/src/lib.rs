//! Batch silence trimming worker.
//!
//! This crate provides:
//! - Configuration loading and validation
//! - Audio file discovery with destination collision handling
//! - The per-file trimming pipeline
//! - A fixed-size worker pool with graceful shutdown
//! - Human-readable reporting

pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod processor;
pub mod report;
pub mod scheduler;

pub use config::{CollisionPolicy, ConfigError, TrimConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::FileLogger;
pub use discovery::discover;
pub use processor::{FileProcessor, UNSUPPORTED_FORMAT};
pub use report::write_report;
pub use scheduler::{BatchScheduler, CANCELLED};
