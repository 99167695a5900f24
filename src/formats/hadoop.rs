//! The `hadoop-snappy` container: no stream header or footer at all.
//! Each outer record is a 4-byte big-endian `source_len` followed by one
//! or more inner `(4-byte BE compressed_len, compressed bytes)` blocks
//! until `source_len` uncompressed bytes have been produced.
//!
//! Block sizing on encode mirrors Hadoop's historical
//! `buffer_size - (buffer_size / 6 + 32)` formula, preserved here
//! bit-for-bit for interop with existing `.snappy` files it wrote.

use std::io::{Read, Write};

use crate::bytes;
use crate::compress::Encoder;
use crate::decompress::Decoder;
use crate::{Error, Result};

const NAME: &str = "hadoop-snappy";
const DEFAULT_BUFFER_SIZE: usize = 262_144;

fn block_size_for(buffer_size: usize) -> usize {
    let buffer_size = if buffer_size == 0 { DEFAULT_BUFFER_SIZE } else { buffer_size };
    buffer_size - (buffer_size / 6 + 32)
}

/// `hadoop-snappy` has no stream-level header, so there is nothing to
/// autodetect and `skip_magic` is always irrelevant for this format; the
/// registry never routes to it from [`super::detect`].
pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    buffer_size: usize,
) -> Result<()> {
    let block_size = block_size_for(buffer_size);
    let mut uc = vec![0u8; block_size];
    let mut c = vec![0u8; crate::compress::max_compress_len(block_size)];
    let mut enc = Encoder::new();

    loop {
        let n = super::framing2::read_fill(&mut reader, &mut uc)?;
        if n == 0 {
            return Ok(());
        }
        let mut source_len = [0u8; 4];
        bytes::write_u32_be(&mut source_len, n as u32);
        writer.write_all(&source_len)?;

        let compress_len = enc.compress(&uc[..n], &mut c)?;
        let mut block_len = [0u8; 4];
        bytes::write_u32_be(&mut block_len, compress_len as u32);
        writer.write_all(&block_len)?;
        writer.write_all(&c[..compress_len])?;
    }
}

pub(crate) fn decompress<R: Read, W: Write>(mut reader: R, mut writer: W, _skip_magic: bool) -> Result<()> {
    let mut dec = Decoder::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();

    loop {
        let source_len = match bytes::io_read_u32_be(&mut reader)? {
            None => return Ok(()),
            Some(n) => n as usize,
        };
        let mut remaining = source_len;
        while remaining > 0 {
            let compressed_len = bytes::io_read_u32_be(&mut reader)?
                .ok_or(Error::UnexpectedEof)? as usize;
            src.resize(compressed_len, 0);
            reader.read_exact(&mut src)?;
            let dn = crate::decompress::decompress_len(&src).map_err(|_| Error::DecodeFailure)?;
            if dn > remaining {
                return Err(Error::SizeOverflow { format: NAME });
            }
            dst.resize(dn, 0);
            dec.decompress(&src, &mut dst).map_err(|_| Error::DecodeFailure)?;
            writer.write_all(&dst)?;
            remaining -= dn;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_ten_bytes() {
        let data = b"0123456789";
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 0).unwrap();
        assert_eq!(&compressed[0..4], &[0x00, 0x00, 0x00, 0x0a]);
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn inflated_source_len_is_size_overflow() {
        // A legitimate 10-byte record, but with source_len bumped to 11 so
        // the single inner block overshoots it.
        let mut ten = Vec::new();
        compress(&b"0123456789"[..], &mut ten, 0).unwrap();
        bytes::write_u32_be(&mut ten[0..4], 11);
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&ten[..], &mut out, false),
            Err(Error::SizeOverflow { .. })
        ));
    }

    #[test]
    fn block_size_formula_matches_hadoop() {
        assert_eq!(block_size_for(262_144), 262_144 - (262_144 / 6 + 32));
    }

    #[test]
    fn roundtrip_spanning_multiple_inner_blocks() {
        let data = vec![7u8; 300_000];
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 4096).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }
}
