/*!
This crate implements the Snappy block compressor and the family of stream
container formats that wrap it: the canonical Snappy frame format together
with the legacy and cross-language variants found across the wider Snappy
ecosystem (`snzip`, `snappy-java`, `snappy-in-java`, `hadoop-snappy`,
`comment-43`, `iwa`), plus a format auto-detector driven by a short file
prefix.

The block compressor (this module's [`compress`]/[`decompress`]) operates on
a single buffer and knows nothing about framing. The [`formats`] module is
where the interesting work happens: each [`formats::Format`] variant is a
self-contained encoder/decoder pair implementing a common contract over
`std::io::Read`/`std::io::Write`.

Typical usage goes through [`formats::Format`] rather than this crate's
low-level [`read`]/[`write`] readers, unless you specifically want the
canonical Snappy frame format (`.sz`) and nothing else.
*/

#![deny(missing_docs)]

use std::error;
use std::fmt;
use std::result;

pub use crate::compress::{compress, max_compress_len, Encoder};
pub use crate::decompress::{decompress, decompress_len, Decoder};
pub use crate::error::{Error, IntoInnerError};

/// The maximum size of an uncompressed block fed into the raw Snappy block
/// compressor at once.
///
/// Individual stream formats may chunk their own input into smaller or
/// larger blocks; this constant only bounds what the block primitive in
/// this module will process in a single call to [`read::FrameEncoder`] or
/// [`write::FrameEncoder`].
const MAX_BLOCK_SIZE: usize = 1 << 16;

/// The maximum length, in bytes, that the raw Snappy format supports for
/// a single buffer (compressed or decompressed).
const MAX_INPUT_SIZE: u64 = std::u32::MAX as u64;

mod buffer;
mod bytes;
mod compress;
mod crc32;
mod decompress;
mod error;
mod frame;

pub mod formats;
pub mod raw;
pub mod read;
pub mod write;

/// A convenient type alias for `Result<T, snzip::Error>`.
pub type Result<T> = result::Result<T, Error>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Tag {
    Literal = 0b00,
    Copy1 = 0b01,
    Copy2 = 0b10,
    Copy4 = 0b11,
}

/// Encode `n` as a base-128 varint (LE, MSB = continuation bit) into `data`.
///
/// Returns the number of bytes written. `data` must have room for at least
/// 10 bytes (the maximum varint length for a `u64`).
fn write_varu64(data: &mut [u8], mut n: u64) -> usize {
    let mut i = 0;
    while n >= 0b1000_0000 {
        data[i] = (n as u8) | 0b1000_0000;
        n >>= 7;
        i += 1;
    }
    data[i] = n as u8;
    i + 1
}

/// Decode a base-128 varint from the front of `data`.
///
/// Returns `(value, bytes_consumed)`. `bytes_consumed` is `0` if `data`
/// does not contain a complete, validly-terminated varint within 10 bytes.
fn read_varu64(data: &[u8]) -> (u64, usize) {
    let mut n: u64 = 0;
    let mut shift: u64 = 0;
    for (i, &b) in data.iter().enumerate().take(10) {
        if b < 0b1000_0000 {
            return (n | ((b as u64) << shift), i + 1);
        }
        n |= ((b as u64) & 0b0111_1111) << shift;
        shift += 7;
    }
    (0, 0)
}

#[cfg(test)]
mod tests {
    use quickcheck::{QuickCheck, StdGen};

    use super::{compress, decompress, decompress_len, max_compress_len};

    fn roundtrip(bytes: &[u8]) -> Vec<u8> {
        depress(&press(bytes))
    }

    fn press(bytes: &[u8]) -> Vec<u8> {
        let mut buf = vec![0; max_compress_len(bytes.len())];
        let n = compress(bytes, &mut buf).unwrap();
        buf.truncate(n);
        buf
    }

    fn depress(bytes: &[u8]) -> Vec<u8> {
        let mut buf = vec![0; decompress_len(bytes).unwrap()];
        decompress(bytes, &mut buf).unwrap();
        buf
    }

    #[test]
    fn qc_roundtrip() {
        fn p(bytes: Vec<u8>) -> bool {
            roundtrip(&bytes) == bytes
        }
        QuickCheck::new()
            .gen(StdGen::new(rand::thread_rng(), 10_000))
            .tests(1_000)
            .quickcheck(p as fn(_) -> _);
    }

    #[test]
    fn roundtrip_empty() {
        assert_eq!(&[] as &[u8], &*roundtrip(&[]));
    }

    #[test]
    fn roundtrip_repeated() {
        let data = vec![b'A'; 10_000];
        assert_eq!(data, roundtrip(&data));
    }
}
