#![deny(unreachable_patterns)]
//! Audio processing for the silence trimmer.
//!
//! This crate provides:
//! - Amplitude-threshold edge silence detection and trim planning
//! - Decode/encode through FFmpeg behind the [`AudioCodec`] trait
//! - Per-format metadata capture and restore behind the [`TagStore`] trait
//! - Type-safe FFmpeg command building with timeouts

pub mod codec;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod silence_removal;
pub mod tags;

pub use codec::{AudioCodec, FfmpegCodec};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_audio, AudioInfo, PictureStream};
pub use silence_removal::{detect, plan, trim_decision, TrimPolicy};
pub use tags::{FfmpegTagStore, TagStore};
