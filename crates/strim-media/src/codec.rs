//! Audio decode/encode.
//!
//! [`AudioCodec`] turns a file into an [`AudioBuffer`] and back. The shipped
//! implementation, [`FfmpegCodec`], streams raw `f32le` PCM through FFmpeg's
//! stdout/stdin so every format FFmpeg can demux is decodable.

use std::path::Path;

use async_trait::async_trait;
use strim_models::{AudioBuffer, AudioFormat, EncodingHints};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils;
use crate::probe::probe_audio;

/// Decodes files into sample buffers and encodes them back.
#[async_trait]
pub trait AudioCodec: Send + Sync {
    /// Decode `path` into interleaved f32 samples.
    async fn decode(&self, path: &Path) -> MediaResult<AudioBuffer>;

    /// Encode `buffer` to `path`, in the format implied by its extension.
    ///
    /// Implementations must not leave a partial file at `path` on failure.
    async fn encode(&self, path: &Path, buffer: &AudioBuffer) -> MediaResult<()>;
}

/// FFmpeg-backed codec.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCodec {
    runner: FfmpegRunner,
}

impl FfmpegCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort any single FFmpeg invocation after `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

#[async_trait]
impl AudioCodec for FfmpegCodec {
    async fn decode(&self, path: &Path) -> MediaResult<AudioBuffer> {
        let info = probe_audio(path)
            .await
            .map_err(|e| into_codec_error(e, |msg| MediaError::decode(path, msg)))?;

        debug!(
            path = %path.display(),
            codec = %info.codec,
            sample_rate = info.sample_rate,
            channels = info.channels,
            "Decoding audio"
        );

        let cmd = FfmpegCommand::to_pipe(path).raw_f32_output(info.sample_rate, info.channels);
        let bytes = self
            .runner
            .run_capture(&cmd)
            .await
            .map_err(|e| into_codec_error(e, |msg| MediaError::decode(path, msg)))?;

        let samples = samples_from_le_bytes(&bytes);
        let hints = EncodingHints {
            bits_per_sample: info.bits_per_sample,
            bit_rate: info.bit_rate,
        };

        AudioBuffer::new(samples, info.channels, info.sample_rate)
            .map(|buffer| buffer.with_hints(hints))
            .map_err(|e| MediaError::decode(path, e.to_string()))
    }

    async fn encode(&self, path: &Path, buffer: &AudioBuffer) -> MediaResult<()> {
        let format = AudioFormat::from_path(path)
            .ok_or_else(|| MediaError::encode(path, "unsupported output extension"))?;
        let codec_args = encoder_args(format, buffer.hints())
            .ok_or_else(|| MediaError::encode(path, format!("FFmpeg has no {format} encoder")))?;

        fs_utils::ensure_parent_dir(path).await?;
        let tmp = fs_utils::temp_sibling(path)?;

        let cmd = FfmpegCommand::from_pipe(&tmp)
            .raw_f32_input(buffer.sample_rate(), buffer.channels())
            .output_args(codec_args)
            .format(format.muxer());

        debug!(
            path = %path.display(),
            format = %format,
            frames = buffer.frame_count(),
            "Encoding audio"
        );

        self.runner
            .run_with_input(&cmd, samples_to_le_bytes(buffer.samples()))
            .await
            .map_err(|e| into_codec_error(e, |msg| MediaError::encode(path, msg)))?;

        fs_utils::persist(tmp, path)
    }
}

/// Wrap a tool failure as a decode/encode error, keeping environment errors as-is.
fn into_codec_error(err: MediaError, wrap: impl FnOnce(String) -> MediaError) -> MediaError {
    match err {
        MediaError::FfmpegNotFound
        | MediaError::FfprobeNotFound
        | MediaError::FileNotFound(_)
        | MediaError::Io(_) => err,
        other => wrap(other.detailed()),
    }
}

/// FFmpeg output arguments selecting the encoder for `format`.
///
/// Returns `None` for formats FFmpeg can read but not write (APE).
pub fn encoder_args(format: AudioFormat, hints: EncodingHints) -> Option<Vec<String>> {
    let args: Vec<String> = match format {
        AudioFormat::Mp3 => {
            let mut args: Vec<String> = vec!["-c:a".into(), "libmp3lame".into()];
            match hints.bit_rate {
                Some(rate) => args.extend(["-b:a".into(), kbps(rate)]),
                None => args.extend(["-q:a".into(), "2".into()]),
            }
            args
        }
        AudioFormat::Flac => {
            let sample_fmt = if pcm_depth(hints) > 16 { "s32" } else { "s16" };
            vec![
                "-c:a".into(),
                "flac".into(),
                "-sample_fmt".into(),
                sample_fmt.into(),
            ]
        }
        AudioFormat::OggVorbis => {
            let mut args: Vec<String> = vec!["-c:a".into(), "libvorbis".into()];
            match hints.bit_rate {
                Some(rate) => args.extend(["-b:a".into(), kbps(rate)]),
                None => args.extend(["-q:a".into(), "5".into()]),
            }
            args
        }
        AudioFormat::Wma => vec![
            "-c:a".into(),
            "wmav2".into(),
            "-b:a".into(),
            kbps(hints.bit_rate.unwrap_or(128_000)),
        ],
        AudioFormat::Wav => vec![
            "-c:a".into(),
            format!("pcm_s{}le", pcm_depth(hints)),
            // no encoder LIST chunk, tags are copied separately
            "-fflags".into(),
            "+bitexact".into(),
        ],
        AudioFormat::Aiff => vec![
            "-c:a".into(),
            format!("pcm_s{}be", pcm_depth(hints)),
        ],
        AudioFormat::Ape => return None,
    };
    Some(args)
}

/// PCM bit depth to encode with: 16, 24 or 32.
fn pcm_depth(hints: EncodingHints) -> u32 {
    match hints.bits_per_sample {
        Some(bits) if bits > 24 => 32,
        Some(bits) if bits > 16 => 24,
        _ => 16,
    }
}

fn kbps(bit_rate: u64) -> String {
    format!("{}k", (bit_rate / 1000).max(8))
}

/// Convert f32le bytes from FFmpeg into samples; a trailing partial sample is dropped.
pub fn samples_from_le_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Convert samples into f32le bytes for FFmpeg.
pub fn samples_to_le_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(bits: Option<u32>, rate: Option<u64>) -> EncodingHints {
        EncodingHints {
            bits_per_sample: bits,
            bit_rate: rate,
        }
    }

    #[test]
    fn test_pcm_samples_from_bytes() {
        let bytes = samples_to_le_bytes(&[0.5, -1.0, 0.25]);
        assert_eq!(bytes.len(), 12);
        assert_eq!(samples_from_le_bytes(&bytes), vec![0.5, -1.0, 0.25]);
        // trailing garbage is ignored
        assert_eq!(samples_from_le_bytes(&bytes[..7]), vec![0.5]);
    }

    #[test]
    fn test_encoder_selection() {
        let mp3 = encoder_args(AudioFormat::Mp3, hints(None, Some(320_000))).unwrap();
        assert_eq!(mp3, vec!["-c:a", "libmp3lame", "-b:a", "320k"]);

        let mp3_vbr = encoder_args(AudioFormat::Mp3, EncodingHints::default()).unwrap();
        assert!(mp3_vbr.contains(&"-q:a".to_string()));

        let wav = encoder_args(AudioFormat::Wav, hints(Some(24), None)).unwrap();
        assert_eq!(wav[1], "pcm_s24le");

        let aiff = encoder_args(AudioFormat::Aiff, EncodingHints::default()).unwrap();
        assert_eq!(aiff[1], "pcm_s16be");

        let flac = encoder_args(AudioFormat::Flac, hints(Some(24), None)).unwrap();
        assert!(flac.contains(&"s32".to_string()));

        let wma = encoder_args(AudioFormat::Wma, EncodingHints::default()).unwrap();
        assert_eq!(wma, vec!["-c:a", "wmav2", "-b:a", "128k"]);

        assert!(encoder_args(AudioFormat::OggVorbis, EncodingHints::default()).is_some());
    }

    #[test]
    fn test_ape_has_no_encoder() {
        assert!(encoder_args(AudioFormat::Ape, EncodingHints::default()).is_none());
    }

    #[test]
    fn test_pcm_depth_rounding() {
        assert_eq!(pcm_depth(hints(None, None)), 16);
        assert_eq!(pcm_depth(hints(Some(8), None)), 16);
        assert_eq!(pcm_depth(hints(Some(20), None)), 24);
        assert_eq!(pcm_depth(hints(Some(32), None)), 32);
    }

    #[tokio::test]
    async fn test_encode_rejects_unknown_extension() {
        let buffer = AudioBuffer::new(vec![0.0; 4], 1, 8_000).unwrap();
        let err = FfmpegCodec::new()
            .encode(Path::new("out.xyz"), &buffer)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Encode { .. }));
    }

    #[tokio::test]
    async fn test_ape_encode_fails_without_touching_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("album.ape");
        let buffer = AudioBuffer::new(vec![0.0; 4], 2, 44_100).unwrap();

        let err = FfmpegCodec::new().encode(&target, &buffer).await.unwrap_err();
        assert!(matches!(err, MediaError::Encode { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_wav_encode_decode_with_ffmpeg() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..8_000).map(|i| ((i as f32) * 0.05).sin() * 0.5).collect();
        let buffer = AudioBuffer::new(samples, 1, 8_000).unwrap();

        let codec = FfmpegCodec::new().with_timeout(30);
        codec.encode(&target, &buffer).await.unwrap();
        let decoded = codec.decode(&target).await.unwrap();

        assert_eq!(decoded.sample_rate(), 8_000);
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.frame_count(), 8_000);
        assert_eq!(decoded.hints().bits_per_sample, Some(16));
    }
}
