//! Metadata carried from a source file onto its trimmed output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw RIFF chunk (four-character id + payload, without the pad byte).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiffChunk {
    pub id: [u8; 4],
    pub data: Vec<u8>,
}

impl RiffChunk {
    pub fn new(id: [u8; 4], data: Vec<u8>) -> Self {
        Self { id, data }
    }

    /// Chunk id as text, e.g. `"LIST"`.
    pub fn id_str(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }

    /// Bytes occupied on disk: header, payload and pad byte.
    pub fn encoded_len(&self) -> usize {
        8 + self.data.len() + (self.data.len() & 1)
    }
}

/// Embedded cover art (ID3 APIC, FLAC PICTURE block) as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    /// FFmpeg codec name of the picture stream (`mjpeg`, `png`, ...)
    pub codec: String,
    pub data: Vec<u8>,
}

impl Artwork {
    pub fn new(codec: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            codec: codec.into(),
            data,
        }
    }

    /// File extension FFmpeg's image demuxer recognises for this codec.
    pub fn extension(&self) -> Option<&'static str> {
        match self.codec.as_str() {
            "mjpeg" => Some("jpg"),
            "png" => Some("png"),
            "bmp" => Some("bmp"),
            "gif" => Some("gif"),
            _ => None,
        }
    }
}

/// Tags captured from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum TagSet {
    /// Key/value tags (title, artist, ...) and the attached picture, if any
    Fields {
        fields: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artwork: Option<Artwork>,
    },
    /// Metadata chunks copied verbatim from a RIFF/WAVE file
    RiffChunks(Vec<RiffChunk>),
}

impl TagSet {
    /// Key/value tags without artwork.
    pub fn fields(fields: BTreeMap<String, String>) -> Self {
        TagSet::Fields {
            fields,
            artwork: None,
        }
    }

    /// Attach cover art. No-op for RIFF chunk sets.
    pub fn with_artwork(mut self, picture: Option<Artwork>) -> Self {
        if let TagSet::Fields { artwork, .. } = &mut self {
            *artwork = picture;
        }
        self
    }

    pub fn artwork(&self) -> Option<&Artwork> {
        match self {
            TagSet::Fields { artwork, .. } => artwork.as_ref(),
            TagSet::RiffChunks(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tags or chunks, counting artwork as one.
    pub fn len(&self) -> usize {
        match self {
            TagSet::Fields { fields, artwork } => fields.len() + usize::from(artwork.is_some()),
            TagSet::RiffChunks(chunks) => chunks.len(),
        }
    }
}

impl Default for TagSet {
    fn default() -> Self {
        TagSet::fields(BTreeMap::new())
    }
}
