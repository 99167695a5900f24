//! The legacy `comment-43` container (named for the line comment marking
//! where it was dropped from later drafts of the frame format).
//!
//! Unlike [`super::framing2`]/[`super::framing`], its chunk length field is
//! only 2 bytes wide and *includes* the trailing CRC, and the stream ends
//! with an explicit end-of-stream chunk rather than just EOF -- which also
//! means multiple streams can be concatenated, each with its own header
//! and EOS chunk.

use std::io::{Read, Write};

use crate::buffer::WorkBuffer;
use crate::bytes;
use crate::compress::Encoder;
use crate::crc32::CheckSummer;
use crate::decompress::Decoder;
use crate::{Error, Result};

const NAME: &str = "comment-43";
const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

const HEADER_BODY: &[u8] = b"snappy";
/// type(0xff) + len(2, LE) + "snappy"
const HEADER_CHUNK: &[u8] = b"\xff\x06\x00snappy";

const TYPE_COMPRESSED: u8 = 0x00;
const TYPE_UNCOMPRESSED: u8 = 0x01;
const TYPE_EOS: u8 = 0xfe;

pub(crate) fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    block_size: usize,
) -> Result<()> {
    let block_size = if block_size == 0 { DEFAULT_BLOCK_SIZE } else { block_size };
    let mut buf = WorkBuffer::new(block_size);
    let mut enc = Encoder::new();
    let checksummer = CheckSummer::new();

    writer.write_all(HEADER_CHUNK)?;
    loop {
        let n = super::framing2::read_fill(&mut reader, &mut buf.uc)?;
        if n == 0 {
            break;
        }
        let src = &buf.uc[..n];
        let checksum = checksummer.crc32c_masked(src);
        let compress_len = enc.compress(src, &mut buf.c)?;
        let (ty, body): (u8, &[u8]) = if compress_len >= src.len() - (src.len() / 8) {
            (TYPE_UNCOMPRESSED, src)
        } else {
            (TYPE_COMPRESSED, &buf.c[..compress_len])
        };
        let mut header = [0u8; 3];
        header[0] = ty;
        bytes::write_u16_le(&mut header[1..], (4 + body.len()) as u16);
        writer.write_all(&header)?;
        let mut crc = [0u8; 4];
        bytes::write_u32_le(&mut crc, checksum);
        writer.write_all(&crc)?;
        writer.write_all(body)?;
    }
    writer.write_all(&[TYPE_EOS, 0x00, 0x00])?;
    Ok(())
}

pub(crate) fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    skip_magic: bool,
) -> Result<()> {
    #[derive(PartialEq)]
    enum State {
        /// Next chunk must be a header chunk.
        NeedHeader,
        /// Inside a stream: data chunks or an EOS chunk are both valid.
        Processing,
        /// Just saw an EOS chunk: either a clean EOF or a new header
        /// (stream concatenation) may follow.
        SawEos,
    }

    let mut dec = Decoder::new();
    let checksummer = CheckSummer::new();
    let mut src = Vec::new();
    let mut dst = Vec::new();
    let mut header = [0u8; 3];
    let mut state = if skip_magic { State::Processing } else { State::NeedHeader };

    loop {
        if !bytes::read_exact_eof(&mut reader, &mut header)? {
            return match state {
                State::Processing => Err(Error::UnexpectedEof),
                State::NeedHeader => Err(Error::InvalidMagic { format: NAME }),
                State::SawEos => Ok(()),
            };
        }
        let ty = header[0];
        let len = bytes::read_u16_le(&header[1..]) as usize;
        if state == State::NeedHeader || state == State::SawEos {
            if header[..] != HEADER_CHUNK[..3] || len != HEADER_BODY.len() {
                return Err(Error::InvalidMagic { format: NAME });
            }
            let mut body = vec![0u8; len];
            reader.read_exact(&mut body)?;
            if body != HEADER_BODY {
                return Err(Error::InvalidMagic { format: NAME });
            }
            state = State::Processing;
            continue;
        }
        match ty {
            TYPE_EOS => {
                if len != 0 {
                    return Err(Error::invalid_chunk(NAME, "end-of-stream chunk carries data"));
                }
                state = State::SawEos;
            }
            TYPE_UNCOMPRESSED | TYPE_COMPRESSED => {
                if len < 4 {
                    return Err(Error::invalid_chunk(
                        NAME,
                        "data chunk shorter than the 4-byte CRC it must carry",
                    ));
                }
                let expected_sum = bytes::io_read_u32_le(&mut reader)?;
                let body_len = len - 4;
                if ty == TYPE_UNCOMPRESSED {
                    dst.resize(body_len, 0);
                    reader.read_exact(&mut dst)?;
                } else {
                    src.resize(body_len, 0);
                    reader.read_exact(&mut src)?;
                    bytes::decode_block(&mut dec, &src, &mut dst)?;
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
            b if b == HEADER_CHUNK[0] => {
                return Err(Error::invalid_chunk(NAME, "unexpected header chunk"));
            }
            b if b >= 0x80 => {
                // Reserved, tolerated: skip the payload.
                super::framing2::skip_bytes(&mut reader, len)?;
            }
            _ => return Err(Error::invalid_chunk(NAME, "unsupported chunk type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_hello_world() {
        let mut compressed = Vec::new();
        compress(&b"hello world"[..], &mut compressed, 1 << 16).unwrap();
        assert_eq!(&compressed[..9], b"\xff\x06\x00snappy");
        // type=uncompressed(1), len=0x000f (11 data + 4 crc), LE.
        assert_eq!(compressed[9], 0x01);
        assert_eq!(&compressed[10..12], &[0x0f, 0x00]);
        assert_eq!(&compressed[12..16], &crc32_bytes(b"hello world"));
        assert_eq!(&compressed[16..27], b"hello world");
        assert_eq!(&compressed[27..30], &[0xfe, 0x00, 0x00]);

        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, b"hello world");
    }

    fn crc32_bytes(data: &[u8]) -> [u8; 4] {
        let mut buf = [0u8; 4];
        bytes::write_u32_le(&mut buf, crate::crc32::masked_crc32c(data));
        buf
    }

    #[test]
    fn roundtrip_multi_block() {
        let data = (0..50_000u32).map(|i| i as u8).collect::<Vec<_>>();
        let mut compressed = Vec::new();
        compress(&data[..], &mut compressed, 4096).unwrap();
        let mut out = Vec::new();
        decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn concatenated_streams() {
        let mut a = Vec::new();
        compress(&b"first stream"[..], &mut a, 1 << 16).unwrap();
        let mut b = Vec::new();
        compress(&b"second stream"[..], &mut b, 1 << 16).unwrap();
        let mut both = a.clone();
        both.extend_from_slice(&b);

        let mut out = Vec::new();
        decompress(&both[..], &mut out, false).unwrap();
        assert_eq!(out, b"first streamsecond stream");
    }

    #[test]
    fn out_of_place_header_chunk_is_invalid() {
        let mut stream = Vec::new();
        compress(&b"first stream"[..], &mut stream, 1 << 16).unwrap();
        // Drop the EOS chunk and splice in another header chunk mid-stream,
        // as if a data chunk had been replaced by a second header.
        stream.truncate(stream.len() - 3);
        stream.extend_from_slice(HEADER_CHUNK);

        let mut out = Vec::new();
        assert!(matches!(
            decompress(&stream[..], &mut out, false),
            Err(Error::InvalidChunk { .. })
        ));
    }
}
