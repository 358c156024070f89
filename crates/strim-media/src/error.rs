//! Error types for media operations.

use std::path::{Path, PathBuf};

use strim_models::FailureKind;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during decoding, encoding and tag handling.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Failed to encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },

    #[error("Failed to copy metadata for {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    #[error("Invalid RIFF data: {0}")]
    InvalidRiff(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a decode error for `path`.
    pub fn decode(path: &Path, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an encode error for `path`.
    pub fn encode(path: &Path, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a metadata error for `path`.
    pub fn metadata(path: &Path, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Outcome category reported for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            MediaError::Decode { .. } => FailureKind::Decode,
            MediaError::Encode { .. } => FailureKind::Encode,
            MediaError::Metadata { .. } | MediaError::InvalidRiff(_) => FailureKind::Metadata,
            MediaError::Io(_) | MediaError::FileNotFound(_) => FailureKind::Io,
            _ => FailureKind::Internal,
        }
    }

    /// Message with FFmpeg's stderr appended when available.
    pub fn detailed(&self) -> String {
        match self {
            MediaError::FfmpegFailed {
                stderr: Some(stderr),
                ..
            }
            | MediaError::FfprobeFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{self}: {}", stderr.trim()),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let path = Path::new("a.mp3");
        assert_eq!(MediaError::decode(path, "x").failure_kind(), FailureKind::Decode);
        assert_eq!(MediaError::encode(path, "x").failure_kind(), FailureKind::Encode);
        assert_eq!(MediaError::metadata(path, "x").failure_kind(), FailureKind::Metadata);
        assert_eq!(
            MediaError::InvalidRiff("short".into()).failure_kind(),
            FailureKind::Metadata
        );
        assert_eq!(
            MediaError::Io(std::io::Error::other("disk")).failure_kind(),
            FailureKind::Io
        );
        assert_eq!(MediaError::FfmpegNotFound.failure_kind(), FailureKind::Internal);
    }

    #[test]
    fn test_detailed_appends_stderr() {
        let err = MediaError::ffmpeg_failed("exit 1", Some("Invalid data found\n".into()), Some(1));
        assert_eq!(
            err.detailed(),
            "FFmpeg command failed: exit 1: Invalid data found"
        );
        assert_eq!(MediaError::Timeout(5).detailed(), "Operation timed out after 5 seconds");
    }
}
