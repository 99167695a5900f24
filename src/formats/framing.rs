//! The older, 9-byte-header draft of the Snappy frame format.
//!
//! Per the open question in the source material: later revisions of the
//! format added a fourth `0x00` byte to the stream header (see
//! [`super::framing2`]) to disambiguate it from `comment-43`'s header
//! chunk, which otherwise collides on the first few bytes. This format is
//! kept only so existing `.sz` files written by old encoders still
//! decompress; new data should always be written as `framing2`, so
//! `compress` here exists for symmetry with the `Format` contract but
//! isn't expected to see real use.

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::crc32::CheckSummer;
use crate::decompress::Decoder;
use crate::frame::{
    compress_frame, ChunkHeader, ChunkType, CHUNK_HEADER_AND_CRC_SIZE, STREAM_BODY,
};
use crate::{Error, Result};

const NAME: &str = "framing";
const DEFAULT_BLOCK_SIZE: usize = 1 << 16;

/// `\xff\x06\x00sNaPpY`: one byte shorter than [`super::framing2`]'s
/// header because it lacks the extra length byte that format later added.
const STREAM_IDENTIFIER: &[u8] = b"\xff\x06\x00sNaPpY";

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
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            return Ok(());
        }
        let frame_data =
            compress_frame(&mut enc, checksummer, &buf.uc[..n], &mut chunk_header, &mut buf.c)?;
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
            Err(_) => super::framing2::skip_bytes(&mut reader, hdr.len)?,
            Ok(ChunkType::Padding) => super::framing2::skip_bytes(&mut reader, hdr.len)?,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data = b"legacy nine byte header".repeat(200);
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 1 << 16).unwrap();
        assert!(compressed.starts_with(STREAM_IDENTIFIER));
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn header_is_nine_bytes_not_ten() {
        assert_eq!(STREAM_IDENTIFIER.len(), 9);
    }
}
