//! The `snzip` container: `"SNZ"` + version + block-size-shift header,
//! varint-prefixed blocks, a zero-varint terminator.
//!
//! <https://github.com/kubo/snzip>

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::compress::Encoder;
use crate::decompress::Decoder;
use crate::{read_varu64, write_varu64, Error, Result};

const NAME: &str = "snzip";
const MAGIC: &[u8] = b"SNZ";
const VERSION: u8 = 1;
const MAX_BLOCK_SHIFT: u8 = 27;
const DEFAULT_BLOCK_SHIFT: u8 = 16;

/// Pick the smallest `k` with `1 << k >= block_size`, clamped to the
/// format's maximum. `block_size == 0` means "use the default".
fn block_shift_for(block_size: usize) -> u8 {
    if block_size == 0 {
        return DEFAULT_BLOCK_SHIFT;
    }
    let mut k = 0u8;
    while (1usize << k) < block_size && k < MAX_BLOCK_SHIFT {
        k += 1;
    }
    k
}

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let shift = block_shift_for(block_size);
    let block_size = 1usize << shift;
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();

    writer.write_all(MAGIC)?;
    writer.write_all(&[VERSION, shift])?;

    let mut varint = [0u8; 10];
    loop {
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            break;
        }
        let compress_len = enc.compress(&buf.uc[..n], &mut buf.c)?;
        let vn = write_varu64(&mut varint, compress_len as u64);
        writer.write_all(&varint[..vn])?;
        writer.write_all(&buf.c[..compress_len])?;
    }
    // Terminator: a single zero byte (varint 0).
    writer.write_all(&[0u8])?;
    Ok(())
}

pub(crate) fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    skip_magic: bool,
) -> Result<()> {
    if !skip_magic {
        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic).map_err(|_| Error::InvalidMagic { format: NAME })?;
        if magic != *MAGIC {
            return Err(Error::InvalidMagic { format: NAME });
        }
    }
    let mut hdr = [0u8; 2];
    reader.read_exact(&mut hdr)?;
    let (version, shift) = (hdr[0], hdr[1]);
    if version != VERSION {
        return Err(Error::InvalidVersion {
            format: NAME,
            version: version as u32,
        });
    }
    if shift > MAX_BLOCK_SHIFT {
        return Err(Error::invalid_chunk(NAME, "block_size_shift exceeds 27"));
    }
    let block_size = 1usize << shift;

    let mut dec = Decoder::new();
    let mut src = Vec::with_capacity(crate::compress::max_compress_len(block_size));
    let mut dst = vec![0u8; block_size];

    loop {
        let len = read_varint_len(&mut reader)?;
        if len == 0 {
            // Zero-length varint is the stream terminator.
            return Ok(());
        }
        if len > src.capacity() {
            return Err(Error::invalid_chunk(NAME, "compressed length exceeds buffer capacity"));
        }
        src.resize(len, 0);
        reader.read_exact(&mut src)?;
        let dn = crate::decompress::decompress_len(&src).map_err(|_| Error::DecodeFailure)?;
        if dn > dst.len() {
            dst.resize(dn, 0);
        }
        dec.decompress(&src, &mut dst[..dn]).map_err(|_| Error::DecodeFailure)?;
        writer.write_all(&dst[..dn])?;
    }
}

/// Read a 1-5 byte base-128 varint directly off a reader, one byte at a
/// time (we don't know its length up front). More than 5 bytes without a
/// terminating (high bit clear) byte is an overflow, never a valid chunk
/// length for this format.
fn read_varint_len<R: Read>(reader: &mut R) -> Result<usize> {
    let mut buf = [0u8; 5];
    let mut n = 0;
    loop {
        let mut b = [0u8; 1];
        if !crate::bytes::read_exact_eof(reader, &mut b)? {
            if n == 0 {
                return Err(Error::UnexpectedEof);
            }
            return Err(Error::invalid_chunk(NAME, "truncated varint length"));
        }
        if n == buf.len() {
            return Err(Error::invalid_chunk(NAME, "varint length longer than 5 bytes"));
        }
        buf[n] = b[0];
        n += 1;
        if b[0] & 0x80 == 0 {
            break;
        }
    }
    let (value, consumed) = read_varu64(&buf[..n]);
    if consumed != n {
        return Err(Error::invalid_chunk(NAME, "malformed varint length"));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_a_repeated_100() {
        let data = vec![b'A'; 100];
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 1 << 16).unwrap();
        assert_eq!(&compressed[..5], &[0x53, 0x4e, 0x5a, 0x01, 0x10]);
        assert_eq!(*compressed.last().unwrap(), 0x00);

        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut stream = b"SNZ".to_vec();
        stream.extend_from_slice(&[2, 16, 0]);
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&stream[..], &mut out, false),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn rejects_oversized_shift() {
        let mut stream = b"SNZ".to_vec();
        stream.extend_from_slice(&[1, 28, 0]);
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&stream[..], &mut out, false),
            Err(Error::InvalidChunk { .. })
        ));
    }

    #[test]
    fn roundtrip_multi_block() {
        let data = (0..100_000u32).map(|i| (i % 251) as u8).collect::<Vec<_>>();
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 4096).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }
}
