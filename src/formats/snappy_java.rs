//! The `snappy-java` container: an 8-byte magic, two 4-byte big-endian
//! version fields, then 4-byte-BE-length-prefixed raw Snappy blocks with no
//! checksum and no terminator (EOF at a chunk boundary ends the stream).
//!
//! <https://github.com/xerial/snappy-java>

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::decompress::Decoder;
use crate::{Error, Result};

const NAME: &str = "snappy-java";
const MAGIC: &[u8] = b"\x82SNAPPY\0";
const VERSION: u32 = 1;
const COMPATIBLE_VERSION: u32 = 1;
const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let block_size = if block_size == 0 { DEFAULT_BLOCK_SIZE } else { block_size };
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();

    writer.write_all(MAGIC)?;
    let mut hdr = [0u8; 8];
    bytes::write_u32_be(&mut hdr[0..4], VERSION);
    bytes::write_u32_be(&mut hdr[4..8], COMPATIBLE_VERSION);
    writer.write_all(&hdr)?;

    loop {
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            return Ok(());
        }
        let compress_len = enc.compress(&buf.uc[..n], &mut buf.c)?;
        let mut len_buf = [0u8; 4];
        bytes::write_u32_be(&mut len_buf, compress_len as u32);
        writer.write_all(&len_buf)?;
        writer.write_all(&buf.c[..compress_len])?;
    }
}

pub(crate) fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    skip_magic: bool,
) -> Result<()> {
    if !skip_magic {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(|_| Error::InvalidMagic { format: NAME })?;
        if magic != *MAGIC {
            return Err(Error::InvalidMagic { format: NAME });
        }
    }
    let mut hdr = [0u8; 8];
    reader.read_exact(&mut hdr)?;
    let version = bytes::read_u32_be(&hdr[0..4]);
    let compatible_version = bytes::read_u32_be(&hdr[4..8]);
    if version != VERSION {
        return Err(Error::InvalidVersion { format: NAME, version });
    }
    if compatible_version != COMPATIBLE_VERSION {
        return Err(Error::InvalidVersion {
            format: NAME,
            version: compatible_version,
        });
    }

    let mut dec = Decoder::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();
    loop {
        let len = match bytes::io_read_u32_be(&mut reader)? {
            None => return Ok(()),
            Some(len) => len as usize,
        };
        if len == 0 {
            return Err(Error::invalid_chunk(NAME, "zero-length compressed block"));
        }
        src.resize(len, 0);
        reader.read_exact(&mut src)?;
        bytes::decode_block(&mut dec, &src, &mut dst)?;
        writer.write_all(&dst)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_hello() {
        let mut compressed = Vec::new();
        compress(&b"hello"[..], &mut compressed, 0).unwrap();
        assert_eq!(
            &compressed[..16],
            &[0x82, 0x53, 0x4e, 0x41, 0x50, 0x50, 0x59, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
              0x00, 0x01]
        );
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn mutated_version_is_rejected() {
        let mut compressed = Vec::new();
        compress(&b"hello"[..], &mut compressed, 0).unwrap();
        compressed[11] = 2; // low byte of the big-endian version field
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&compressed[..], &mut out, false),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn roundtrip_multi_block() {
        let data = (0..200_000u32).map(|i| (i % 7) as u8).collect::<Vec<_>>();
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 8192).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }
}
