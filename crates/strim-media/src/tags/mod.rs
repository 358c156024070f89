//! Metadata capture and restore.
//!
//! Tags are read from the source before anything is overwritten and written
//! onto the trimmed output afterwards. Where a format keeps its tags is
//! decided once by [`AudioFormat::tag_layout`]:
//!
//! | layout | formats | how |
//! |---|---|---|
//! | container | MP3, FLAC, WMA, AIFF | FFprobe format tags, `ffmpeg -c copy -metadata` |
//! | stream | Ogg Vorbis | FFprobe stream tags, `-metadata:s:a:0` |
//! | RIFF chunks | WAV | metadata chunks copied byte-for-byte |
//! | none | APE | skipped |
//!
//! Cover art in MP3, FLAC and AIFF is captured as the raw attached picture
//! and muxed back as a second input with the `attached_pic` disposition.

pub mod riff;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use strim_models::{Artwork, AudioFormat, RiffChunk, TagLayout, TagSet};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils;
use crate::probe::{probe_audio, PictureStream};

/// Tags FFmpeg writes by itself and that should not be carried over.
const GENERATED_TAGS: [&str; 2] = ["encoder", "major_brand"];

/// Reads and writes per-format metadata.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Capture the tags of `path`. Formats without tag support yield an empty set.
    async fn read_tags(&self, path: &Path, format: AudioFormat) -> MediaResult<TagSet>;

    /// Write `tags` onto `path`. Formats without tag support are a no-op.
    async fn write_tags(&self, path: &Path, format: AudioFormat, tags: &TagSet) -> MediaResult<()>;
}

/// FFmpeg-backed tag store with native RIFF chunk copy for WAV.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTagStore {
    runner: FfmpegRunner,
}

impl FfmpegTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort any single FFmpeg invocation after `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    async fn read_fields(
        &self,
        path: &Path,
        format: AudioFormat,
        layout: TagLayout,
    ) -> MediaResult<TagSet> {
        let info = probe_audio(path).await?;

        let artwork = match &info.attached_picture {
            Some(picture) if format.supports_artwork() => {
                self.read_artwork(path, picture).await?
            }
            _ => None,
        };

        let fields = match layout {
            // Some muxers hoist Vorbis comments to the container
            TagLayout::Stream if info.stream_tags.is_empty() => info.format_tags,
            TagLayout::Stream => info.stream_tags,
            _ => info.format_tags,
        };
        Ok(TagSet::fields(without_generated(fields)).with_artwork(artwork))
    }

    /// Copy the attached picture stream out of `path` without re-encoding.
    async fn read_artwork(&self, path: &Path, picture: &PictureStream) -> MediaResult<Option<Artwork>> {
        let artwork = Artwork::new(picture.codec.clone(), Vec::new());
        if artwork.extension().is_none() {
            debug!(path = %path.display(), codec = %picture.codec, "Skipping cover art in unsupported codec");
            return Ok(None);
        }

        let cmd = FfmpegCommand::to_pipe(path)
            .map(format!("0:{}", picture.index))
            .output_args(["-c", "copy"])
            .format("image2pipe");
        let data = self.runner.run_capture(&cmd).await?;

        Ok((!data.is_empty()).then(|| Artwork { data, ..artwork }))
    }

    async fn write_fields(
        &self,
        path: &Path,
        format: AudioFormat,
        layout: TagLayout,
        fields: &BTreeMap<String, String>,
        artwork: Option<&Artwork>,
    ) -> MediaResult<()> {
        let tmp = fs_utils::temp_sibling(path)?;

        let cover = match artwork.filter(|_| format.supports_artwork()) {
            Some(art) => match art.extension() {
                Some(ext) => {
                    let cover = fs_utils::temp_sibling(&path.with_extension(ext))?;
                    tokio::fs::write(&cover, &art.data).await?;
                    Some(cover)
                }
                None => None,
            },
            None => None,
        };

        let cmd = retag_command(
            path,
            &tmp,
            format,
            layout,
            fields,
            cover.as_deref(),
        );
        self.runner.run(&cmd).await?;
        fs_utils::persist(tmp, path)
    }

    async fn write_chunks(&self, path: &Path, chunks: &[RiffChunk]) -> MediaResult<()> {
        let bytes = tokio::fs::read(path).await?;
        let rewritten = riff::replace_chunks(&bytes, chunks)?;

        let tmp = fs_utils::temp_sibling(path)?;
        tokio::fs::write(&tmp, rewritten).await?;
        fs_utils::persist(tmp, path)
    }
}

#[async_trait]
impl TagStore for FfmpegTagStore {
    async fn read_tags(&self, path: &Path, format: AudioFormat) -> MediaResult<TagSet> {
        let result = match format.tag_layout() {
            None => Ok(TagSet::default()),
            Some(TagLayout::RiffChunks) => tokio::fs::read(path)
                .await
                .map_err(MediaError::from)
                .and_then(|bytes| riff::metadata_chunks(&bytes))
                .map(TagSet::RiffChunks),
            Some(layout) => self.read_fields(path, format, layout).await,
        };

        let tags = result.map_err(|e| MediaError::metadata(path, e.detailed()))?;
        debug!(path = %path.display(), format = %format, count = tags.len(), "Read tags");
        Ok(tags)
    }

    async fn write_tags(&self, path: &Path, format: AudioFormat, tags: &TagSet) -> MediaResult<()> {
        let Some(layout) = format.tag_layout() else {
            return Ok(());
        };
        if tags.is_empty() {
            return Ok(());
        }

        let result = match (layout, tags) {
            (TagLayout::RiffChunks, TagSet::RiffChunks(chunks)) => {
                self.write_chunks(path, chunks).await
            }
            (TagLayout::Container | TagLayout::Stream, TagSet::Fields { fields, artwork }) => {
                self.write_fields(path, format, layout, fields, artwork.as_ref())
                    .await
            }
            _ => Err(MediaError::internal(format!(
                "tag set does not match the {format} tag layout"
            ))),
        };

        result.map_err(|e| MediaError::metadata(path, e.detailed()))?;
        debug!(path = %path.display(), format = %format, count = tags.len(), "Wrote tags");
        Ok(())
    }
}

/// Remux `input` into `output` with `fields` and an optional cover picture.
fn retag_command(
    input: &Path,
    output: &Path,
    format: AudioFormat,
    layout: TagLayout,
    fields: &BTreeMap<String, String>,
    cover: Option<&Path>,
) -> FfmpegCommand {
    let mut cmd = match cover {
        Some(cover) => FfmpegCommand::new(input, output)
            .add_input(cover)
            .map("0:a")
            .map("1:0")
            .output_args(["-c", "copy", "-disposition:v:0", "attached_pic"]),
        None => FfmpegCommand::new(input, output).copy_streams(),
    }
    .strip_metadata();

    for (key, value) in fields {
        cmd = match layout {
            TagLayout::Stream => cmd.stream_metadata(key, value),
            _ => cmd.metadata(key, value),
        };
    }
    cmd = match format {
        AudioFormat::Mp3 => cmd.output_args(["-id3v2_version", "3"]),
        AudioFormat::Aiff => cmd.output_args(["-write_id3v2", "1"]),
        _ => cmd,
    };
    cmd.format(format.muxer())
}

fn without_generated(mut fields: BTreeMap<String, String>) -> BTreeMap<String, String> {
    fields.retain(|key, _| {
        !GENERATED_TAGS
            .iter()
            .any(|generated| key.eq_ignore_ascii_case(generated))
    });
    fields
}
