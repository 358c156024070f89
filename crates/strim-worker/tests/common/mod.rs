//! In-memory collaborators for driving the pipeline without FFmpeg.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strim_media::{AudioCodec, MediaError, MediaResult, TagStore};
use strim_models::{AudioBuffer, AudioFormat, TagSet};
use strim_worker::TrimConfig;

/// File contents that make the fake codec fail to decode.
pub const CORRUPT: &str = "corrupt";
/// File contents that make the fake codec panic.
pub const PANIC: &str = "panic";

/// On-disk representation used by [`FakeCodec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeAudio {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl FakeAudio {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

/// 1000 mono frames at 1 kHz, loud in 100..900 and quiet elsewhere.
pub fn padded_tone() -> FakeAudio {
    FakeAudio {
        channels: 1,
        sample_rate: 1_000,
        samples: (0..1_000)
            .map(|i| if (100..900).contains(&i) { 0.5 } else { 0.001 })
            .collect(),
    }
}

/// Audio that is loud from the first to the last frame.
pub fn loud_tone() -> FakeAudio {
    FakeAudio {
        channels: 2,
        sample_rate: 1_000,
        samples: vec![0.5; 1_000],
    }
}

pub fn write_audio(path: &Path, audio: &FakeAudio) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec(audio).unwrap()).unwrap();
}

pub fn write_raw(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

pub fn read_audio(path: &Path) -> FakeAudio {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Settings matching the fixtures: -40 dB floor, 10 frames padding, no gating.
pub fn test_config(root: &Path, destination: Option<PathBuf>) -> TrimConfig {
    TrimConfig {
        root_folder: root.to_path_buf(),
        replace_files: destination.is_none(),
        destination_folder: destination,
        noise_floor_db: -40.0,
        padding_frames: 10,
        min_silence_seconds: 0.0,
        worker_count: 2,
        ..Default::default()
    }
}

/// Codec storing buffers as JSON.
#[derive(Debug, Default)]
pub struct FakeCodec {
    pub decodes: AtomicUsize,
    pub encodes: AtomicUsize,
}

impl FakeCodec {
    pub fn encode_count(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioCodec for FakeCodec {
    async fn decode(&self, path: &Path) -> MediaResult<AudioBuffer> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        let contents = tokio::fs::read_to_string(path).await?;
        if contents == PANIC {
            panic!("decoder crashed on {}", path.display());
        }
        let audio: FakeAudio = serde_json::from_str(&contents)
            .map_err(|e| MediaError::decode(path, e.to_string()))?;
        AudioBuffer::new(audio.samples, audio.channels, audio.sample_rate)
            .map_err(|e| MediaError::decode(path, e.to_string()))
    }

    async fn encode(&self, path: &Path, buffer: &AudioBuffer) -> MediaResult<()> {
        if AudioFormat::from_path(path) == Some(AudioFormat::Ape) {
            return Err(MediaError::encode(path, "no APE encoder"));
        }
        self.encodes.fetch_add(1, Ordering::SeqCst);
        let audio = FakeAudio {
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            samples: buffer.samples().to_vec(),
        };
        tokio::fs::write(path, serde_json::to_vec(&audio)?).await?;
        Ok(())
    }
}

/// Tag store keyed by path.
#[derive(Debug, Default)]
pub struct FakeTagStore {
    pub tags: Mutex<HashMap<PathBuf, TagSet>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FakeTagStore {
    /// Store whose writes are refused.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    /// Store that cannot read any file's tags.
    pub fn unreadable() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn set(&self, path: &Path, tags: TagSet) {
        self.tags.lock().unwrap().insert(path.to_path_buf(), tags);
    }

    pub fn get(&self, path: &Path) -> Option<TagSet> {
        self.tags.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl TagStore for FakeTagStore {
    async fn read_tags(&self, path: &Path, _format: AudioFormat) -> MediaResult<TagSet> {
        if self.fail_reads {
            return Err(MediaError::metadata(path, "no readable tag header"));
        }
        Ok(self.get(path).unwrap_or_default())
    }

    async fn write_tags(&self, path: &Path, _format: AudioFormat, tags: &TagSet) -> MediaResult<()> {
        if self.fail_writes {
            return Err(MediaError::metadata(path, "tag write refused"));
        }
        self.set(path, tags.clone());
        Ok(())
    }
}
