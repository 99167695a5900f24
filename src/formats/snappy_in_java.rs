//! The `snappy-in-java` container (distinct from `snappy-java`, above): a
//! 7-byte magic, then flag/length/checksum-prefixed blocks with a 2-byte
//! big-endian length and a big-endian masked CRC32C.
//!
//! <https://github.com/dain/snappy>

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::crc32::CheckSummer;
use crate::decompress::Decoder;
use crate::{Error, Result};

const NAME: &str = "snappy-in-java";
const MAGIC: &[u8] = b"snappy\0";
const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;
const MAX_BLOCK_SIZE: usize = 65535;

const FLAG_UNCOMPRESSED: u8 = 0x00;
const FLAG_COMPRESSED: u8 = 0x01;

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let block_size = match block_size {
        0 => DEFAULT_BLOCK_SIZE,
        n if n > MAX_BLOCK_SIZE => MAX_BLOCK_SIZE,
        n => n,
    };
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();
    let checksummer = CheckSummer::new();

    writer.write_all(MAGIC)?;
    loop {
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            return Ok(());
        }
        let src = &buf.uc[..n];
        let checksum = checksummer.crc32c_masked(src);
        let compress_len = enc.compress(src, &mut buf.c)?;
        let (flag, body): (u8, &[u8]) = if compress_len >= src.len() - (src.len() / 8) {
            (FLAG_UNCOMPRESSED, src)
        } else {
            (FLAG_COMPRESSED, &buf.c[..compress_len])
        };
        let mut hdr = [0u8; 7];
        hdr[0] = flag;
        bytes::write_u16_be(&mut hdr[1..3], body.len() as u16);
        bytes::write_u32_be(&mut hdr[3..7], checksum);
        writer.write_all(&hdr)?;
        writer.write_all(body)?;
    }
}

pub(crate) fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    skip_magic: bool,
) -> Result<()> {
    if !skip_magic {
        let mut magic = [0u8; 7];
        reader.read_exact(&mut magic).map_err(|_| Error::InvalidMagic { format: NAME })?;
        if magic != *MAGIC {
            return Err(Error::InvalidMagic { format: NAME });
        }
    }

    let mut dec = Decoder::new();
    let checksummer = CheckSummer::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();
    let mut hdr = [0u8; 7];
    loop {
        if !bytes::read_exact_eof(&mut reader, &mut hdr)? {
            return Ok(());
        }
        let flag = hdr[0];
        let len = bytes::read_u16_be(&hdr[1..3]) as usize;
        let expected_sum = bytes::read_u32_be(&hdr[3..7]);
        match flag {
            FLAG_UNCOMPRESSED => {
                dst.resize(len, 0);
                reader.read_exact(&mut dst)?;
            }
            FLAG_COMPRESSED => {
                src.resize(len, 0);
                reader.read_exact(&mut src)?;
                bytes::decode_block(&mut dec, &src, &mut dst)?;
            }
            _ => return Err(Error::invalid_chunk(NAME, "unknown block flag")),
        }
        let got_sum = checksummer.crc32c_masked(&dst);
        if expected_sum != got_sum {
            return Err(Error::ChecksumMismatch {
                expected: expected_sum,
                got: got_sum,
            });
        }
        writer.write_all(&dst)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_flip_in_first_block_crc_is_detected() {
        let data = vec![b'q'; 40_000];
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 0).unwrap();
        // First block's header starts right after the 7-byte magic; the
        // CRC occupies bytes [3..7) of that 7-byte header.
        let crc_offset = MAGIC.len() + 3;
        compressed[crc_offset] ^= 0x01;
        let mut out = Vec::new();
        assert!(matches!(
            decompress(&compressed[..], &mut out, false),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn roundtrip_two_blocks() {
        let data = (0..40_000u32).map(|i| (i % 97) as u8).collect::<Vec<_>>();
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 0).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn block_size_is_clamped_to_max() {
        let data = vec![1u8; 10];
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 1 << 20).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }
}
