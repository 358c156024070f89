//! RIFF/WAVE chunk handling for WAV metadata.
//!
//! WAV tags live in side chunks (`LIST`/`INFO`, ID3, broadcast extension...)
//! that generic tag APIs only partly understand. They are copied verbatim
//! from the source file into the trimmed output instead.

use std::ops::Range;

use strim_models::RiffChunk;

use crate::error::{MediaError, MediaResult};

/// Chunk ids treated as metadata.
pub const METADATA_CHUNK_IDS: [[u8; 4]; 6] = [*b"LIST", *b"id3 ", *b"ID3 ", *b"bext", *b"iXML", *b"_PMX"];

const HEADER_LEN: usize = 12;

/// A chunk located inside a RIFF byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChunkSpan {
    id: [u8; 4],
    /// Payload range, without header or pad byte
    data: Range<usize>,
    /// Whole chunk range including header and pad byte
    whole: Range<usize>,
}

pub fn is_metadata_chunk(id: &[u8; 4]) -> bool {
    METADATA_CHUNK_IDS.contains(id)
}

/// Walk the top-level chunks of a RIFF/WAVE file.
fn parse_chunks(bytes: &[u8]) -> MediaResult<Vec<ChunkSpan>> {
    if bytes.len() < HEADER_LEN {
        return Err(MediaError::InvalidRiff(format!(
            "{} bytes is too short for a RIFF header",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(MediaError::InvalidRiff(format!(
            "expected RIFF magic, found {:?}",
            String::from_utf8_lossy(&bytes[0..4])
        )));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(MediaError::InvalidRiff("RIFF form type is not WAVE".to_string()));
    }

    let mut chunks = Vec::new();
    let mut offset = HEADER_LEN;

    while offset + 8 <= bytes.len() {
        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[offset..offset + 4]);
        let size = u32::from_le_bytes([
            bytes[offset + 4],
            bytes[offset + 5],
            bytes[offset + 6],
            bytes[offset + 7],
        ]) as usize;

        let data_start = offset + 8;
        // Streamed writers leave oversized lengths on the last chunk
        let data_end = data_start.saturating_add(size).min(bytes.len());
        let padded_end = (data_end + (size & 1)).min(bytes.len());

        chunks.push(ChunkSpan {
            id,
            data: data_start..data_end,
            whole: offset..padded_end,
        });
        offset = padded_end;
    }

    Ok(chunks)
}

/// Extract the metadata chunks of a WAV file, in file order.
pub fn metadata_chunks(bytes: &[u8]) -> MediaResult<Vec<RiffChunk>> {
    Ok(parse_chunks(bytes)?
        .into_iter()
        .filter(|chunk| is_metadata_chunk(&chunk.id))
        .map(|chunk| RiffChunk::new(chunk.id, bytes[chunk.data].to_vec()))
        .collect())
}

/// Rebuild a WAV file with `chunks` inserted ahead of the `data` chunk.
///
/// Existing chunks with the same id as an inserted one are dropped; every
/// other chunk is kept byte-for-byte. The RIFF size field is recomputed.
pub fn replace_chunks(bytes: &[u8], chunks: &[RiffChunk]) -> MediaResult<Vec<u8>> {
    let spans = parse_chunks(bytes)?;
    let replaced = |id: &[u8; 4]| chunks.iter().any(|c| &c.id == id);

    let extra: usize = chunks.iter().map(RiffChunk::encoded_len).sum();
    let mut out = Vec::with_capacity(bytes.len() + extra);
    out.extend_from_slice(&bytes[0..HEADER_LEN]);

    let mut inserted = false;
    for span in &spans {
        if &span.id == b"data" && !inserted {
            append_chunks(&mut out, chunks)?;
            inserted = true;
        }
        if replaced(&span.id) {
            continue;
        }
        out.extend_from_slice(&bytes[span.whole.clone()]);
        // Restore a pad byte lost to truncation
        if (span.data.len() & 1) == 1 && span.whole.end == span.data.end {
            out.push(0);
        }
    }
    if !inserted {
        append_chunks(&mut out, chunks)?;
    }

    let riff_size = u32::try_from(out.len() - 8)
        .map_err(|_| MediaError::InvalidRiff("output exceeds 4 GiB RIFF limit".to_string()))?;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());

    Ok(out)
}

fn append_chunks(out: &mut Vec<u8>, chunks: &[RiffChunk]) -> MediaResult<()> {
    for chunk in chunks {
        let size = u32::try_from(chunk.data.len()).map_err(|_| {
            MediaError::InvalidRiff(format!("chunk {} is too large", chunk.id_str()))
        })?;
        out.extend_from_slice(&chunk.id);
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&chunk.data);
        if chunk.data.len() & 1 == 1 {
            out.push(0);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_bytes(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn wave(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    fn riff_size(bytes: &[u8]) -> usize {
        u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize
    }

    #[test]
    fn test_extracts_metadata_chunks_in_order() {
        let source = wave(&[
            chunk_bytes(b"fmt ", &[1; 16]),
            chunk_bytes(b"bext", b"broadcast"),
            chunk_bytes(b"data", &[0; 8]),
            chunk_bytes(b"LIST", b"INFOINAM\x05\0\0\0Song\0"),
        ]);

        let chunks = metadata_chunks(&source).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id_str(), "bext");
        assert_eq!(chunks[0].data, b"broadcast");
        assert_eq!(chunks[1].id_str(), "LIST");
    }

    #[test]
    fn test_replace_inserts_before_data_and_patches_size() {
        let output = wave(&[chunk_bytes(b"fmt ", &[2; 16]), chunk_bytes(b"data", &[7; 6])]);
        let tags = vec![RiffChunk::new(*b"LIST", b"INFO".to_vec())];

        let rewritten = replace_chunks(&output, &tags).unwrap();
        assert_eq!(riff_size(&rewritten), rewritten.len() - 8);

        let ids: Vec<[u8; 4]> = parse_chunks(&rewritten)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![*b"fmt ", *b"LIST", *b"data"]);
        // audio payload untouched
        assert!(rewritten.ends_with(&chunk_bytes(b"data", &[7; 6])));
    }

    #[test]
    fn test_replace_drops_same_id_chunks() {
        let output = wave(&[
            chunk_bytes(b"fmt ", &[2; 16]),
            chunk_bytes(b"LIST", b"INFOISFT\x04\0\0\0Lavf"),
            chunk_bytes(b"data", &[1; 4]),
        ]);
        let tags = vec![RiffChunk::new(*b"LIST", b"INFOINAM".to_vec())];

        let rewritten = replace_chunks(&output, &tags).unwrap();
        let lists = metadata_chunks(&rewritten).unwrap();
        assert_eq!(lists, tags);
    }

    #[test]
    fn test_odd_sized_chunks_are_padded() {
        let output = wave(&[chunk_bytes(b"fmt ", &[2; 16]), chunk_bytes(b"data", &[1; 4])]);
        let tags = vec![RiffChunk::new(*b"iXML", b"<x/>a".to_vec())];

        let rewritten = replace_chunks(&output, &tags).unwrap();
        assert_eq!(rewritten.len() % 2, 0);
        assert_eq!(metadata_chunks(&rewritten).unwrap(), tags);
    }

    #[test]
    fn test_round_trip_through_extract_and_replace() {
        let source = wave(&[
            chunk_bytes(b"fmt ", &[1; 16]),
            chunk_bytes(b"id3 ", b"ID3\x03"),
            chunk_bytes(b"_PMX", b"xmp"),
            chunk_bytes(b"data", &[9; 32]),
        ]);
        let output = wave(&[chunk_bytes(b"fmt ", &[1; 16]), chunk_bytes(b"data", &[9; 10])]);

        let tags = metadata_chunks(&source).unwrap();
        let rewritten = replace_chunks(&output, &tags).unwrap();
        assert_eq!(metadata_chunks(&rewritten).unwrap(), tags);
    }

    #[test]
    fn test_truncated_data_chunk_is_tolerated() {
        let mut output = wave(&[chunk_bytes(b"fmt ", &[1; 16])]);
        output.extend_from_slice(b"data");
        output.extend_from_slice(&u32::MAX.to_le_bytes());
        output.extend_from_slice(&[3; 6]);

        let rewritten = replace_chunks(&output, &[RiffChunk::new(*b"bext", vec![0; 2])]).unwrap();
        assert_eq!(riff_size(&rewritten), rewritten.len() - 8);
        assert!(rewritten.ends_with(&[3; 6]));
    }

    #[test]
    fn test_rejects_non_wave_input() {
        assert!(matches!(metadata_chunks(b"RIFF"), Err(MediaError::InvalidRiff(_))));
        assert!(matches!(
            metadata_chunks(b"RIFX\0\0\0\0WAVE"),
            Err(MediaError::InvalidRiff(_))
        ));
        assert!(matches!(
            metadata_chunks(b"RIFF\x04\0\0\0AVI "),
            Err(MediaError::InvalidRiff(_))
        ));
    }
}
