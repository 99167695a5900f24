/*!
This module provides a `std::io::Write` implementation for the canonical
Snappy frame format: [`FrameEncoder`] wraps another `std::io::Write`,
compressing bytes written to it.

A `write::FrameDecoder` (decompress-as-you-write) isn't provided; use
[`crate::read::FrameDecoder`] instead.
*/

use std::fmt;
use std::io::{self, Write};

use crate::compress::Encoder;
use crate::crc32::CheckSummer;
pub use crate::error::IntoInnerError;
use crate::frame::{compress_frame, CHUNK_HEADER_AND_CRC_SIZE, MAX_COMPRESS_BLOCK_SIZE, STREAM_IDENTIFIER};
use crate::MAX_BLOCK_SIZE;

/// A writer that compresses bytes written to it into the Snappy frame
/// format (file extension `sz`).
///
/// Writes are buffered internally up to one block, so wrapping the
/// underlying writer in a `BufWriter` is unnecessary. The writer is
/// flushed automatically on drop; a flush error at that point is silently
/// discarded, so call [`Write::flush`] explicitly if you need to observe
/// it.
pub struct FrameEncoder<W: io::Write> {
    inner: Option<Inner<W>>,
    src: Vec<u8>,
}

struct Inner<W> {
    w: W,
    enc: Encoder,
    checksummer: CheckSummer,
    dst: Vec<u8>,
    wrote_stream_ident: bool,
    chunk_header: [u8; CHUNK_HEADER_AND_CRC_SIZE],
}

impl<W: io::Write> FrameEncoder<W> {
    /// Create a new writer for streaming Snappy compression.
    pub fn new(wtr: W) -> FrameEncoder<W> {
        FrameEncoder {
            inner: Some(Inner {
                w: wtr,
                enc: Encoder::new(),
                checksummer: CheckSummer::new(),
                dst: vec![0; MAX_COMPRESS_BLOCK_SIZE],
                wrote_stream_ident: false,
                chunk_header: [0; CHUNK_HEADER_AND_CRC_SIZE],
            }),
            src: Vec::with_capacity(MAX_BLOCK_SIZE),
        }
    }

    /// Returns the underlying stream, consuming and flushing this writer.
    pub fn into_inner(mut self) -> Result<W, IntoInnerError<FrameEncoder<W>>> {
        match self.flush() {
            Ok(()) => Ok(self.inner.take().unwrap().w),
            Err(err) => Err(IntoInnerError::new(self, err)),
        }
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner.as_ref().unwrap().w
    }

    /// Gets a mutable reference to the underlying writer.
    ///
    /// Mutating the output stream directly can corrupt this encoder's
    /// state; take care.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner.as_mut().unwrap().w
    }
}

impl<W: io::Write> Drop for FrameEncoder<W> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            let _ = self.flush();
        }
    }
}

impl<W: io::Write> io::Write for FrameEncoder<W> {
    fn write(&mut self, mut buf: &[u8]) -> io::Result<usize> {
        let mut total = 0;
        loop {
            let free = self.src.capacity() - self.src.len();
            let n = if buf.len() <= free {
                break;
            } else if self.src.is_empty() {
                self.inner.as_mut().unwrap().write(buf)?
            } else {
                self.src.extend_from_slice(&buf[0..free]);
                self.flush()?;
                free
            };
            buf = &buf[n..];
            total += n;
        }
        debug_assert!(buf.len() <= self.src.capacity() - self.src.len());
        self.src.extend_from_slice(buf);
        total += buf.len();
        debug_assert!(self.src.capacity() == MAX_BLOCK_SIZE);
        Ok(total)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.src.is_empty() {
            return Ok(());
        }
        self.inner.as_mut().unwrap().write(&self.src)?;
        self.src.truncate(0);
        Ok(())
    }
}

impl<W: io::Write> Inner<W> {
    fn write(&mut self, mut buf: &[u8]) -> io::Result<usize> {
        let mut total = 0;
        if !self.wrote_stream_ident {
            self.wrote_stream_ident = true;
            self.w.write_all(STREAM_IDENTIFIER)?;
        }
        while !buf.is_empty() {
            let mut src = buf;
            if src.len() > MAX_BLOCK_SIZE {
                src = &src[0..MAX_BLOCK_SIZE];
            }
            buf = &buf[src.len()..];
            let frame_data = compress_frame(
                &mut self.enc,
                self.checksummer,
                src,
                &mut self.chunk_header,
                &mut self.dst,
            )?;
            self.w.write_all(&self.chunk_header)?;
            self.w.write_all(frame_data)?;
            total += src.len();
        }
        Ok(total)
    }
}

impl<W: fmt::Debug + io::Write> fmt::Debug for FrameEncoder<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FrameEncoder")
            .field("inner", &"[...]")
            .field("src", &"[...]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::FrameDecoder;
    use std::io::Read;

    #[test]
    fn roundtrip() {
        let data = b"abcabcabcabc".repeat(1000);
        let mut compressed = Vec::new();
        {
            let mut w = FrameEncoder::new(&mut compressed);
            w.write_all(&data).unwrap();
            w.flush().unwrap();
        }
        let mut out = Vec::new();
        FrameDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn flushes_on_drop() {
        let mut compressed = Vec::new();
        {
            let mut w = FrameEncoder::new(&mut compressed);
            w.write_all(b"dropped without an explicit flush").unwrap();
        }
        let mut out = Vec::new();
        FrameDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, b"dropped without an explicit flush");
    }
}
