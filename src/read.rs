/*!
This module provides two `std::io::Read` implementations for the canonical
Snappy frame format (`.sz`, the current `framing2` container):

* [`FrameDecoder`] wraps another `std::io::Read`, decompressing as it
  reads.
* [`FrameEncoder`] wraps another `std::io::Read`, compressing as it reads.

For anything other than the canonical frame format -- `snzip`,
`snappy-java`, `hadoop-snappy`, and the other containers in the wider
Snappy ecosystem -- use [`crate::formats`] instead.
*/

use std::cmp;
use std::fmt;
use std::io;

use crate::bytes;
use crate::compress::Encoder;
use crate::crc32::CheckSummer;
use crate::decompress::{decompress_len, Decoder};
use crate::error::Error;
use crate::frame::{
    compress_frame, ChunkHeader, ChunkType, CHUNK_HEADER_AND_CRC_SIZE, MAX_COMPRESS_BLOCK_SIZE,
    STREAM_BODY, STREAM_IDENTIFIER,
};
use crate::MAX_BLOCK_SIZE;

const MAX_READ_FRAME_ENCODER_BLOCK_SIZE: usize =
    STREAM_IDENTIFIER.len() + CHUNK_HEADER_AND_CRC_SIZE + MAX_COMPRESS_BLOCK_SIZE;

/// A reader that decompresses a Snappy frame-format stream as it is read.
///
/// This reader can make many small reads against the underlying stream, so
/// wrapping it in a `BufReader` rarely helps; wrapping *this* in one is more
/// useful if your caller reads in small pieces.
pub struct FrameDecoder<R: io::Read> {
    r: R,
    dec: Decoder,
    checksummer: CheckSummer,
    src: Vec<u8>,
    dst: Vec<u8>,
    dsts: usize,
    dste: usize,
    read_stream_ident: bool,
}

impl<R: io::Read> FrameDecoder<R> {
    /// Create a new reader for streaming Snappy decompression.
    pub fn new(rdr: R) -> FrameDecoder<R> {
        FrameDecoder {
            r: rdr,
            dec: Decoder::new(),
            checksummer: CheckSummer::new(),
            src: vec![0; MAX_COMPRESS_BLOCK_SIZE],
            dst: vec![0; MAX_BLOCK_SIZE],
            dsts: 0,
            dste: 0,
            read_stream_ident: false,
        }
    }

    /// Gets a reference to the underlying reader in this decoder.
    pub fn get_ref(&self) -> &R {
        &self.r
    }

    /// Gets a mutable reference to the underlying reader in this decoder.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.r
    }

    /// Gets the underlying reader, discarding any buffered state.
    pub fn into_inner(self) -> R {
        self.r
    }
}

impl<R: io::Read> io::Read for FrameDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.dsts < self.dste {
                let len = cmp::min(self.dste - self.dsts, buf.len());
                let dste = self.dsts + len;
                buf[..len].copy_from_slice(&self.dst[self.dsts..dste]);
                self.dsts = dste;
                return Ok(len);
            }
            if !bytes::read_exact_eof(&mut self.r, &mut self.src[0..4])? {
                return Ok(0);
            }
            let hdr = ChunkHeader::parse(&self.src[0..4]);
            if !self.read_stream_ident {
                if hdr.ty != Ok(ChunkType::Stream) {
                    return Err(Error::InvalidMagic { format: "framing2" }.into());
                }
                self.read_stream_ident = true;
            }
            if hdr.len > self.src.len() {
                return Err(
                    Error::invalid_chunk("framing2", "chunk length exceeds buffer capacity")
                        .into(),
                );
            }
            match hdr.ty {
                Err(b) if (0x02..=0x7f).contains(&b) => {
                    return Err(Error::invalid_chunk("framing2", "reserved unskippable chunk type").into());
                }
                Err(_) => {
                    // 0x80-0xfd: reserved but skippable.
                    self.r.read_exact(&mut self.src[0..hdr.len])?;
                }
                Ok(ChunkType::Padding) => {
                    self.r.read_exact(&mut self.src[0..hdr.len])?;
                }
                Ok(ChunkType::Stream) => {
                    if hdr.len != STREAM_BODY.len() {
                        return Err(Error::InvalidMagic { format: "framing2" }.into());
                    }
                    self.r.read_exact(&mut self.src[0..hdr.len])?;
                    if &self.src[0..hdr.len] != STREAM_BODY {
                        return Err(Error::InvalidMagic { format: "framing2" }.into());
                    }
                }
                Ok(ChunkType::Uncompressed) => {
                    let n = crate::frame::check_data_chunk_len("framing2", hdr.len)?;
                    let expected_sum = bytes::io_read_u32_le(&mut self.r)?;
                    if n > self.dst.len() {
                        return Err(
                            Error::invalid_chunk("framing2", "uncompressed chunk too large").into(),
                        );
                    }
                    self.r.read_exact(&mut self.dst[0..n])?;
                    let got_sum = self.checksummer.crc32c_masked(&self.dst[0..n]);
                    if expected_sum != got_sum {
                        return Err(Error::ChecksumMismatch {
                            expected: expected_sum,
                            got: got_sum,
                        }
                        .into());
                    }
                    self.dsts = 0;
                    self.dste = n;
                }
                Ok(ChunkType::Compressed) => {
                    let sn = crate::frame::check_data_chunk_len("framing2", hdr.len)?;
                    let expected_sum = bytes::io_read_u32_le(&mut self.r)?;
                    if sn > self.src.len() {
                        return Err(
                            Error::invalid_chunk("framing2", "compressed chunk too large").into(),
                        );
                    }
                    self.r.read_exact(&mut self.src[0..sn])?;
                    let dn = decompress_len(&self.src[0..sn])?;
                    if dn > self.dst.len() {
                        return Err(
                            Error::invalid_chunk("framing2", "decompressed block too large").into(),
                        );
                    }
                    self.dec.decompress(&self.src[0..sn], &mut self.dst[0..dn])?;
                    let got_sum = self.checksummer.crc32c_masked(&self.dst[0..dn]);
                    if expected_sum != got_sum {
                        return Err(Error::ChecksumMismatch {
                            expected: expected_sum,
                            got: got_sum,
                        }
                        .into());
                    }
                    self.dsts = 0;
                    self.dste = dn;
                }
            }
        }
    }
}

impl<R: fmt::Debug + io::Read> fmt::Debug for FrameDecoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("r", &self.r)
            .field("src", &"[...]")
            .field("dst", &"[...]")
            .field("dsts", &self.dsts)
            .field("dste", &self.dste)
            .field("read_stream_ident", &self.read_stream_ident)
            .finish()
    }
}

/// A reader that compresses data into the Snappy frame format as it is read.
///
/// Unlike `FrameDecoder`, this tries to make large reads roughly
/// block-sized, so wrapping the underlying reader in a `BufReader` doesn't
/// usually help.
pub struct FrameEncoder<R: io::Read> {
    inner: Inner<R>,
    dst: Vec<u8>,
    dsts: usize,
    dste: usize,
}

struct Inner<R: io::Read> {
    r: R,
    enc: Encoder,
    checksummer: CheckSummer,
    src: Vec<u8>,
    wrote_stream_ident: bool,
}

impl<R: io::Read> FrameEncoder<R> {
    /// Create a new reader for streaming Snappy compression.
    pub fn new(rdr: R) -> FrameEncoder<R> {
        FrameEncoder {
            inner: Inner {
                r: rdr,
                enc: Encoder::new(),
                checksummer: CheckSummer::new(),
                src: vec![0; MAX_BLOCK_SIZE],
                wrote_stream_ident: false,
            },
            dst: vec![0; MAX_READ_FRAME_ENCODER_BLOCK_SIZE],
            dsts: 0,
            dste: 0,
        }
    }

    /// Gets a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner.r
    }

    /// Gets a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner.r
    }

    fn read_from_dst(&mut self, buf: &mut [u8]) -> usize {
        let available = self.dste - self.dsts;
        let count = cmp::min(available, buf.len());
        buf[..count].copy_from_slice(&self.dst[self.dsts..self.dsts + count]);
        self.dsts += count;
        count
    }
}

impl<R: io::Read> io::Read for FrameEncoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.read_from_dst(buf);
        if count > 0 {
            Ok(count)
        } else if buf.len() >= MAX_READ_FRAME_ENCODER_BLOCK_SIZE {
            self.inner.read_frame(buf)
        } else {
            let count = self.inner.read_frame(&mut self.dst)?;
            self.dsts = 0;
            self.dste = count;
            Ok(self.read_from_dst(buf))
        }
    }
}

impl<R: io::Read> Inner<R> {
    fn read_frame(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        debug_assert!(dst.len() >= MAX_READ_FRAME_ENCODER_BLOCK_SIZE);
        let nread = self.r.read(&mut self.src)?;
        if nread == 0 {
            return Ok(0);
        }
        let mut dst_write_start = 0;
        if !self.wrote_stream_ident {
            dst[0..STREAM_IDENTIFIER.len()].copy_from_slice(STREAM_IDENTIFIER);
            dst_write_start += STREAM_IDENTIFIER.len();
            self.wrote_stream_ident = true;
        }
        let (chunk_header, remaining_dst) =
            dst[dst_write_start..].split_at_mut(CHUNK_HEADER_AND_CRC_SIZE);
        dst_write_start += CHUNK_HEADER_AND_CRC_SIZE;
        let frame_len = compress_frame(
            &mut self.enc,
            self.checksummer,
            &self.src[..nread],
            chunk_header,
            remaining_dst,
        )?
        .len();
        Ok(dst_write_start + frame_len)
    }
}

impl<R: fmt::Debug + io::Read> fmt::Debug for FrameEncoder<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FrameEncoder")
            .field("inner", &"[...]")
            .field("dsts", &self.dsts)
            .field("dste", &self.dste)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write as _};

    #[test]
    fn roundtrip_via_frame_encoder_and_decoder() {
        let data = b"hello hello hello world world world".repeat(50);
        let mut enc = FrameEncoder::new(&data[..]);
        let mut compressed = Vec::new();
        enc.read_to_end(&mut compressed).unwrap();

        let mut dec = FrameDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        dec.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn empty_input_is_just_the_stream_identifier() {
        let mut enc = FrameEncoder::new(&b""[..]);
        let mut compressed = Vec::new();
        enc.read_to_end(&mut compressed).unwrap();
        assert_eq!(compressed, b"");
    }

    #[test]
    fn matches_writer_output() {
        let data = b"some data to round trip through both APIs".repeat(10);
        let mut compressed = Vec::new();
        {
            let mut w = crate::write::FrameEncoder::new(&mut compressed);
            w.write_all(&data).unwrap();
            w.flush().unwrap();
        }
        let mut dec = FrameDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        dec.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
