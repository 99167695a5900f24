//! Wire-level plumbing shared by the canonical Snappy frame format
//! (`framing2`, exposed at the crate root via [`crate::read`]/[`crate::write`])
//! and its 9-byte-header predecessor (`formats::framing`).
//!
//! Both formats share an identical chunk body: a 1-byte type, a 3-byte
//! little-endian length, and (for data chunks) a 4-byte little-endian
//! masked CRC32C of the *uncompressed* payload. They differ only in the
//! stream identifier chunk's length, which is why `STREAM_IDENTIFIER` lives
//! per-format rather than here.

use crate::bytes;
use crate::compress::{max_compress_len, Encoder};
use crate::crc32::CheckSummer;
use crate::{Error, Result, MAX_BLOCK_SIZE};

/// The current (10-byte-header) stream identifier chunk: type `0xff`,
/// length `6`, body `"sNaPpY"`.
pub(crate) const STREAM_IDENTIFIER: &[u8] = b"\xff\x06\x00\x00sNaPpY";

/// The body of the stream identifier chunk, common to both header shapes.
pub(crate) const STREAM_BODY: &[u8] = b"sNaPpY";

/// Size of a chunk header: 1-byte type + 3-byte LE length + 4-byte CRC.
pub(crate) const CHUNK_HEADER_AND_CRC_SIZE: usize = 1 + 3 + 4;

/// The largest compressed form a single `MAX_BLOCK_SIZE` block can take.
pub(crate) const MAX_COMPRESS_BLOCK_SIZE: usize = max_compress_len(MAX_BLOCK_SIZE);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ChunkType {
    Stream = 0xff,
    Compressed = 0x00,
    Uncompressed = 0x01,
    Padding = 0xfe,
}

impl ChunkType {
    pub(crate) fn from_u8(b: u8) -> result_u8::Result<ChunkType> {
        match b {
            0xff => Ok(ChunkType::Stream),
            0x00 => Ok(ChunkType::Compressed),
            0x01 => Ok(ChunkType::Uncompressed),
            0xfe => Ok(ChunkType::Padding),
            other => Err(other),
        }
    }
}

/// A tiny private shim so `ChunkType::from_u8` can return `Result<ChunkType, u8>`
/// without colliding with `crate::Result`.
mod result_u8 {
    pub(crate) type Result<T> = std::result::Result<T, u8>;
}

/// Compress one block, applying the 7/8 incompressibility-fallback rule,
/// and write its chunk header into `chunk_header`. Returns the frame body
/// that should follow the header: either `src` itself (uncompressed
/// fallback) or the compressed prefix of `dst`.
pub(crate) fn compress_frame<'a>(
    enc: &mut Encoder,
    checksummer: CheckSummer,
    src: &'a [u8],
    chunk_header: &mut [u8],
    dst: &'a mut [u8],
) -> Result<&'a [u8]> {
    debug_assert_eq!(chunk_header.len(), CHUNK_HEADER_AND_CRC_SIZE);
    let checksum = checksummer.crc32c_masked(src);
    let compress_len = enc.compress(src, dst)?;
    let (chunk_type, frame_data): (ChunkType, &[u8]) = if compress_len >= src.len() - (src.len() / 8)
    {
        (ChunkType::Uncompressed, src)
    } else {
        (ChunkType::Compressed, &dst[..compress_len])
    };
    chunk_header[0] = chunk_type as u8;
    bytes::write_u24_le(&mut chunk_header[1..4], (4 + frame_data.len()) as u32);
    bytes::write_u32_le(&mut chunk_header[4..8], checksum);
    Ok(frame_data)
}

/// One parsed chunk header: `(type byte, chunk length)`. `len` is the
/// number of bytes that follow the header (for data chunks, this includes
/// the 4-byte CRC).
pub(crate) struct ChunkHeader {
    pub(crate) ty: std::result::Result<ChunkType, u8>,
    pub(crate) len: usize,
}

impl ChunkHeader {
    pub(crate) fn parse(buf: &[u8]) -> ChunkHeader {
        debug_assert_eq!(buf.len(), 4);
        ChunkHeader {
            ty: ChunkType::from_u8(buf[0]),
            len: bytes::read_u24_le(&buf[1..]) as usize,
        }
    }
}

/// Validate a data chunk's declared length and split it into `(plaintext_len, checksum)`
/// bookkeeping for the caller, returning an error for the cases common to
/// both `framing` and `framing2`.
pub(crate) fn check_data_chunk_len(format: &'static str, len: usize) -> Result<usize> {
    if len < 4 {
        return Err(Error::invalid_chunk(
            format,
            "data chunk shorter than the 4-byte CRC it must carry",
        ));
    }
    Ok(len - 4)
}
