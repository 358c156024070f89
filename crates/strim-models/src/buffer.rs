//! In-memory PCM audio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trim::TrimWindow;

/// Errors raised when constructing an [`AudioBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("channel count must be at least 1")]
    NoChannels,

    #[error("sample rate must be positive")]
    ZeroSampleRate,

    #[error("{samples} samples is not a whole number of {channels}-channel frames")]
    PartialFrame { samples: usize, channels: u16 },
}

/// Source properties captured at decode time.
///
/// The encoder uses them to stay close to the original file (PCM bit depth,
/// lossy bitrate) instead of falling back to codec defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingHints {
    /// Bits per sample of the source stream (PCM formats, FLAC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<u32>,
    /// Stream bitrate in bits/second (lossy formats)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u64>,
}

/// Interleaved floating-point audio.
///
/// One frame holds `channels` samples; amplitudes are nominally in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    hints: EncodingHints,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Result<Self, BufferError> {
        if channels == 0 {
            return Err(BufferError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        if samples.len() % channels as usize != 0 {
            return Err(BufferError::PartialFrame {
                samples: samples.len(),
                channels,
            });
        }

        Ok(Self {
            samples,
            channels,
            sample_rate,
            hints: EncodingHints::default(),
        })
    }

    /// Attach encoding hints captured from the source.
    pub fn with_hints(mut self, hints: EncodingHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn hints(&self) -> EncodingHints {
        self.hints
    }

    /// Number of frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Iterate over frames, each a slice of `channels` samples.
    pub fn frames(&self) -> std::slice::ChunksExact<'_, f32> {
        self.samples.chunks_exact(self.channels as usize)
    }

    /// Copy the frames covered by `window` into a new buffer.
    ///
    /// The window is clamped to the buffer, so the result always holds
    /// `min(window.end, frames) - min(window.start, frames)` frames.
    pub fn slice(&self, window: TrimWindow) -> AudioBuffer {
        let frames = self.frame_count();
        let start = window.start_index().min(frames);
        let end = window.end_index().min(frames).max(start);
        let width = self.channels as usize;

        AudioBuffer {
            samples: self.samples[start * width..end * width].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
            hints: self.hints,
        }
    }
}
