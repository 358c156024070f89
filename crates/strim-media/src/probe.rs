//! FFprobe audio information.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Audio stream information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
    /// Bits per sample for PCM codecs
    pub bits_per_sample: Option<u32>,
    /// Bitrate in bits/second
    pub bit_rate: Option<u64>,
    /// Audio codec
    pub codec: String,
    /// Duration in seconds
    pub duration: f64,
    /// Container-level tags
    pub format_tags: BTreeMap<String, String>,
    /// Tags on the first audio stream
    pub stream_tags: BTreeMap<String, String>,
    /// Embedded cover picture stream
    pub attached_picture: Option<PictureStream>,
}

/// A video stream flagged as an attached picture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PictureStream {
    /// Stream index for `-map 0:<index>`
    pub index: usize,
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: Option<usize>,
    codec_type: String,
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u16>,
    bits_per_sample: Option<u32>,
    bits_per_raw_sample: Option<String>,
    bit_rate: Option<String>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

/// Probe an audio file for stream parameters and tags.
pub async fn probe_audio(path: impl AsRef<Path>) -> MediaResult<AudioInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    // Check FFprobe exists
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Parse FFprobe's JSON output into [`AudioInfo`].
fn parse_probe_output(json: &[u8]) -> MediaResult<AudioInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let attached_picture = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video" && s.disposition.attached_pic == 1)
        .and_then(|s| {
            Some(PictureStream {
                index: s.index?,
                codec: s.codec_name.clone()?,
            })
        });

    // Find audio stream
    let stream = probe
        .streams
        .into_iter()
        .find(|s| s.codec_type == "audio")
        .ok_or_else(|| MediaError::UnsupportedFormat("No audio stream found".to_string()))?;

    let sample_rate = stream
        .sample_rate
        .as_deref()
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|r| *r > 0)
        .ok_or_else(|| MediaError::UnsupportedFormat("Audio stream has no sample rate".to_string()))?;

    let channels = stream
        .channels
        .filter(|c| *c > 0)
        .ok_or_else(|| MediaError::UnsupportedFormat("Audio stream has no channels".to_string()))?;

    // Lossy codecs report 0 here
    let bits_per_sample = stream
        .bits_per_sample
        .filter(|b| *b > 0)
        .or_else(|| {
            stream
                .bits_per_raw_sample
                .as_deref()
                .and_then(|b| b.parse::<u32>().ok())
                .filter(|b| *b > 0)
        });

    let (duration, format_bit_rate, format_tags) = match probe.format {
        Some(format) => (
            format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .unwrap_or(0.0),
            format.bit_rate.as_deref().and_then(|b| b.parse::<u64>().ok()),
            format.tags,
        ),
        None => (0.0, None, BTreeMap::new()),
    };

    let bit_rate = stream
        .bit_rate
        .as_deref()
        .and_then(|b| b.parse::<u64>().ok())
        .or(format_bit_rate)
        .filter(|b| *b > 0);

    Ok(AudioInfo {
        sample_rate,
        channels,
        bits_per_sample,
        bit_rate,
        codec: stream.codec_name.unwrap_or_default(),
        duration,
        format_tags,
        stream_tags: stream.tags,
        attached_picture,
    })
}
