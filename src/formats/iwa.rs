//! The `iwa` container used by Apple's iWork file formats: no stream
//! header, no checksum. Each chunk is a 1-byte type (always `0`) followed
//! by a 3-byte little-endian length and that many bytes of raw Snappy
//! block data. Each chunk's uncompressed size is capped at 65536 bytes.
//!
//! <https://github.com/obriensp/iWorkFileFormat>

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::decompress::Decoder;
use crate::{Error, Result};

const NAME: &str = "iwa";
const CHUNK_TYPE: u8 = 0x00;
const MAX_UNCOMPRESSED_CHUNK_SIZE: usize = 65536;
const DEFAULT_BLOCK_SIZE: usize = MAX_UNCOMPRESSED_CHUNK_SIZE;

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let block_size = match block_size {
        0 => DEFAULT_BLOCK_SIZE,
        n if n > MAX_UNCOMPRESSED_CHUNK_SIZE => MAX_UNCOMPRESSED_CHUNK_SIZE,
        n => n,
    };
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();

    loop {
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            return Ok(());
        }
        let compress_len = enc.compress(&buf.uc[..n], &mut buf.c)?;
        let mut header = [0u8; 4];
        header[0] = CHUNK_TYPE;
        bytes::write_u24_le(&mut header[1..], compress_len as u32);
        writer.write_all(&header)?;
        writer.write_all(&buf.c[..compress_len])?;
    }
}

/// `iwa` has no stream-level magic; `skip_magic` exists only to satisfy the
/// shared per-format signature and has no effect here.
pub(crate) fn decompress<R: Read, W: Write>(mut reader: R, mut writer: W, _skip_magic: bool) -> Result<()> {
    let mut dec = Decoder::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();
    let mut header = [0u8; 4];

    loop {
        if !bytes::read_exact_eof(&mut reader, &mut header)? {
            return Ok(());
        }
        let ty = header[0];
        if ty != CHUNK_TYPE {
            return Err(Error::invalid_chunk(NAME, "unsupported chunk type"));
        }
        let len = bytes::read_u24_le(&header[1..]) as usize;
        src.resize(len, 0);
        reader.read_exact(&mut src)?;
        let dn = crate::decompress::decompress_len(&src).map_err(|_| Error::DecodeFailure)?;
        if dn > MAX_UNCOMPRESSED_CHUNK_SIZE {
            return Err(Error::SizeOverflow { format: NAME });
        }
        dst.resize(dn, 0);
        dec.decompress(&src, &mut dst).map_err(|_| Error::DecodeFailure)?;
        writer.write_all(&dst)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_small_chunk() {
        let data = b"iwa payload data";
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 0).unwrap();
        assert_eq!(compressed[0], 0x00);
        let len = bytes::read_u24_le(&compressed[1..4]) as usize;
        assert_eq!(compressed.len(), 4 + len);
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn unsupported_chunk_type_is_rejected() {
        let mut compressed = Vec::new();
        compress(&b"hi"[..], &mut compressed, 0).unwrap();
        compressed[0] = 0x01;
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&compressed[..], &mut out, false),
            Err(Error::InvalidChunk { .. })
        ));
    }

    #[test]
    fn roundtrip_multi_chunk() {
        let data = (0..200_000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>();
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 40_000).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }
}
