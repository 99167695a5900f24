//! The current Snappy frame format (10-byte stream header), per
//! <https://github.com/google/snappy/blob/master/framing_format.txt>.
//!
//! This is the canonical container; [`crate::read`]/[`crate::write`]
//! expose the same wire format through a more ergonomic `io::Read`/`io::Write`
//! pair for callers who only ever want this one format. This module
//! implements it again, directly against the pull-based `compress`/`decompress`
//! contract every [`super::Format`] shares, so that format-agnostic callers
//! (the registry, autodetection) don't need to special-case it.

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::crc32::CheckSummer;
use crate::decompress::Decoder;
use crate::frame::{
    compress_frame, ChunkHeader, ChunkType, CHUNK_HEADER_AND_CRC_SIZE, STREAM_BODY,
    STREAM_IDENTIFIER,
};
use crate::{Error, Result};

const NAME: &str = "framing2";
const DEFAULT_BLOCK_SIZE: usize = 1 << 16;

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let block_size = if block_size == 0 { DEFAULT_BLOCK_SIZE } else { block_size };
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();
    let checksummer = CheckSummer::new();
    let mut chunk_header = [0u8; CHUNK_HEADER_AND_CRC_SIZE];

    writer.write_all(STREAM_IDENTIFIER)?;
    loop {
        let n = read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            return Ok(());
        }
        let frame_data = compress_frame(&mut enc, checksummer, &buf.uc[..n], &mut chunk_header, &mut buf.c)?;
        writer.write_all(&chunk_header)?;
        writer.write_all(frame_data)?;
    }
}

pub(crate) fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    skip_magic: bool,
) -> Result<()> {
    let mut dec = Decoder::new();
    let checksummer = CheckSummer::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();
    let mut header = [0u8; 4];
    let mut read_stream_ident = skip_magic;

    loop {
        if !bytes::read_exact_eof(&mut reader, &mut header)? {
            if !read_stream_ident {
                return Err(Error::InvalidMagic { format: NAME });
            }
            return Ok(());
        }
        let hdr = ChunkHeader::parse(&header);
        if !read_stream_ident {
            if hdr.ty != Ok(ChunkType::Stream) {
                return Err(Error::InvalidMagic { format: NAME });
            }
            read_stream_ident = true;
        }
        match hdr.ty {
            Err(b) if (0x02..=0x7f).contains(&b) => {
                return Err(Error::invalid_chunk(NAME, "reserved unskippable chunk type"));
            }
            Err(b) => {
                log::trace!("skipping reserved skippable chunk type 0x{:02x} ({} bytes)", b, hdr.len);
                skip_bytes(&mut reader, hdr.len)?;
            }
            Ok(ChunkType::Padding) => {
                skip_bytes(&mut reader, hdr.len)?;
            }
            Ok(ChunkType::Stream) => {
                if hdr.len != STREAM_BODY.len() {
                    return Err(Error::InvalidMagic { format: NAME });
                }
                src.resize(hdr.len, 0);
                reader.read_exact(&mut src)?;
                if src != STREAM_BODY {
                    return Err(Error::InvalidMagic { format: NAME });
                }
            }
            Ok(ChunkType::Uncompressed) => {
                let n = crate::frame::check_data_chunk_len(NAME, hdr.len)?;
                let expected_sum = bytes::io_read_u32_le(&mut reader)?;
                dst.resize(n, 0);
                reader.read_exact(&mut dst)?;
                check_sum(&checksummer, &dst, expected_sum)?;
                writer.write_all(&dst)?;
            }
            Ok(ChunkType::Compressed) => {
                let sn = crate::frame::check_data_chunk_len(NAME, hdr.len)?;
                let expected_sum = bytes::io_read_u32_le(&mut reader)?;
                src.resize(sn, 0);
                reader.read_exact(&mut src)?;
                bytes::decode_block(&mut dec, &src, &mut dst)?;
                check_sum(&checksummer, &dst, expected_sum)?;
                writer.write_all(&dst)?;
            }
        }
    }
}

fn check_sum(checksummer: &CheckSummer, data: &[u8], expected: u32) -> Result<()> {
    let got = checksummer.crc32c_masked(data);
    if expected != got {
        log::debug!("{}: checksum mismatch (expected 0x{:08x}, got 0x{:08x})", NAME, expected, got);
        return Err(Error::ChecksumMismatch { expected, got });
    }
    Ok(())
}

pub(crate) fn skip_bytes<R: Read>(reader: &mut R, n: usize) -> Result<()> {
    let mut remaining = n;
    let mut buf = [0u8; 4096];
    while remaining > 0 {
        let take = remaining.min(buf.len());
        reader.read_exact(&mut buf[..take])?;
        remaining -= take;
    }
    Ok(())
}

/// Fill `buf` from `reader`, stopping short only at EOF. Unlike
/// `read_exact`, a clean EOF with zero bytes read returns `Ok(0)` rather
/// than erroring, and a partial fill before EOF returns the partial count
/// rather than erroring -- the caller treats "less than a full block" the
/// same as "a full block", since block boundaries carry no meaning.
pub(crate) fn read_fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match reader.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(read) => n += read,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from(e)),
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let mut compressed = Vec::new();
        compress(data, &mut compressed, 1 << 16).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn empty_input_is_just_the_stream_identifier() {
        let mut compressed = Vec::new();
        compress(&b""[..], &mut compressed, 1 << 16).unwrap();
        assert_eq!(compressed, STREAM_IDENTIFIER);
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn roundtrip_small_and_large() {
        roundtrip(b"hello world");
        roundtrip(&vec![b'A'; 5]);
        roundtrip(&vec![0u8; 1 << 20]);
        roundtrip(&(0..=255u8).cycle().take(200_000).collect::<Vec<_>>());
    }

    #[test]
    fn incompressible_random_data_uses_uncompressed_chunks() {
        // A cheap pseudo-random generator is enough to defeat Snappy's
        // matcher without pulling in `rand` for a non-test build.
        let mut state = 0x2545F4914F6CDD1Du64;
        let mut data = vec![0u8; 10_000];
        for b in data.iter_mut() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *b = state as u8;
        }
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 1 << 16).unwrap();
        assert_eq!(compressed[STREAM_IDENTIFIER.len()], ChunkType::Uncompressed as u8);
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn all_zero_data_is_compressed() {
        let data = vec![0u8; 10_000];
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 1 << 16).unwrap();
        assert_eq!(compressed[STREAM_IDENTIFIER.len()], ChunkType::Compressed as u8);
    }

    #[test]
    fn missing_stream_identifier_is_invalid_magic() {
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&b"not a snappy stream"[..], &mut out, false),
            Err(Error::InvalidMagic { format: "framing2" })
        ));
    }

    #[test]
    fn bit_flip_in_checksum_is_detected() {
        let mut compressed = Vec::new();
        compress(&b"hello world, this is a test of checksums"[..], &mut compressed, 1 << 16).unwrap();
        // Flip a bit inside the checksum field of the first (only) data chunk.
        let crc_offset = STREAM_IDENTIFIER.len() + 4;
        compressed[crc_offset] ^= 0x01;
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&compressed[..], &mut out, false),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncated_stream_is_unexpected_eof() {
        let mut compressed = Vec::new();
        compress(&vec![b'x'; 100_000], &mut compressed, 1 << 16).unwrap();
        for cut in [STREAM_IDENTIFIER.len() + 1, compressed.len() - 1, compressed.len() / 2] {
            let mut out = Vec::new();
            let result = decompress(&compressed[..cut], &mut out, false);
            assert!(result.is_err(), "truncating to {} bytes should fail", cut);
        }
    }
}
