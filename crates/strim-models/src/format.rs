//! Supported audio container formats.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// How a format stores its tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagLayout {
    /// Container-level tags (ID3, FLAC/ASF metadata, AIFF ID3 chunk)
    Container,
    /// Per-stream tags (Vorbis comments in Ogg)
    Stream,
    /// Raw RIFF chunks copied byte-for-byte (WAV)
    RiffChunks,
}

/// Audio formats discovered and processed by the trimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Mp3,
    Flac,
    OggVorbis,
    Wma,
    Wav,
    Aiff,
    Ape,
}

impl AudioFormat {
    /// Every supported format.
    pub const ALL: [AudioFormat; 7] = [
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::OggVorbis,
        AudioFormat::Wma,
        AudioFormat::Wav,
        AudioFormat::Aiff,
        AudioFormat::Ape,
    ];

    /// Resolve the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::OggVorbis),
            "wma" => Some(Self::Wma),
            "wav" => Some(Self::Wav),
            "aiff" | "aif" => Some(Self::Aiff),
            "ape" => Some(Self::Ape),
            _ => None,
        }
    }

    /// Resolve the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::OggVorbis => "ogg",
            Self::Wma => "wma",
            Self::Wav => "wav",
            Self::Aiff => "aiff",
            Self::Ape => "ape",
        }
    }

    /// FFmpeg muxer name for `-f`.
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::OggVorbis => "ogg",
            Self::Wma => "asf",
            Self::Wav => "wav",
            Self::Aiff => "aiff",
            Self::Ape => "ape",
        }
    }

    /// Where the format keeps its tags, `None` when tags cannot be written.
    pub fn tag_layout(&self) -> Option<TagLayout> {
        match self {
            Self::Mp3 | Self::Flac | Self::Wma | Self::Aiff => Some(TagLayout::Container),
            Self::OggVorbis => Some(TagLayout::Stream),
            Self::Wav => Some(TagLayout::RiffChunks),
            Self::Ape => None,
        }
    }

    /// Whether FFmpeg can mux an attached cover picture into this format.
    pub fn supports_artwork(&self) -> bool {
        matches!(self, Self::Mp3 | Self::Flac | Self::Aiff)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::OggVorbis => "ogg_vorbis",
            Self::Wma => "wma",
            Self::Wav => "wav",
            Self::Aiff => "aiff",
            Self::Ape => "ape",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_is_case_insensitive() {
        assert_eq!(AudioFormat::from_path("a/b/Song.MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path("take.Wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_path("loop.aif"), Some(AudioFormat::Aiff));
    }

    #[test]
    fn test_unsupported_extensions() {
        assert_eq!(AudioFormat::from_path("notes.txt"), None);
        assert_eq!(AudioFormat::from_path("no_extension"), None);
        assert_eq!(AudioFormat::from_path("clip.m4a"), None);
    }

    #[test]
    fn test_extension_round_trips() {
        for format in AudioFormat::ALL {
            assert_eq!(AudioFormat::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn test_tag_layouts() {
        assert_eq!(AudioFormat::Wav.tag_layout(), Some(TagLayout::RiffChunks));
        assert_eq!(AudioFormat::OggVorbis.tag_layout(), Some(TagLayout::Stream));
        assert_eq!(AudioFormat::Mp3.tag_layout(), Some(TagLayout::Container));
        assert_eq!(AudioFormat::Ape.tag_layout(), None);
    }

    #[test]
    fn test_artwork_support() {
        let with_art: Vec<AudioFormat> = AudioFormat::ALL
            .into_iter()
            .filter(AudioFormat::supports_artwork)
            .collect();
        assert_eq!(with_art, vec![AudioFormat::Mp3, AudioFormat::Flac, AudioFormat::Aiff]);
    }

    #[test]
    fn test_wma_uses_asf_muxer() {
        assert_eq!(AudioFormat::Wma.muxer(), "asf");
    }
}
