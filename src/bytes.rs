//! Small endian-explicit primitives shared by the stream format codecs.
//!
//! Each wire format picks its own length-field width and byte order; rather
//! than let host byte order leak in anywhere, every codec goes through one
//! of these helpers.

use std::io;

use byteorder::{BigEndian as BE, ByteOrder, LittleEndian as LE};

use crate::Error;

pub(crate) fn read_u16_le(buf: &[u8]) -> u16 {
    LE::read_u16(buf)
}

pub(crate) fn read_u16_be(buf: &[u8]) -> u16 {
    BE::read_u16(buf)
}

pub(crate) fn read_u24_le(buf: &[u8]) -> u32 {
    LE::read_u24(buf)
}

pub(crate) fn read_u24_be(buf: &[u8]) -> u32 {
    BE::read_u24(buf)
}

pub(crate) fn read_u32_le(buf: &[u8]) -> u32 {
    LE::read_u32(buf)
}

pub(crate) fn read_u32_be(buf: &[u8]) -> u32 {
    BE::read_u32(buf)
}

pub(crate) fn write_u16_le(buf: &mut [u8], n: u16) {
    LE::write_u16(buf, n)
}

pub(crate) fn write_u16_be(buf: &mut [u8], n: u16) {
    BE::write_u16(buf, n)
}

pub(crate) fn write_u24_le(buf: &mut [u8], n: u32) {
    LE::write_u24(buf, n)
}

pub(crate) fn write_u32_le(buf: &mut [u8], n: u32) {
    LE::write_u32(buf, n)
}

pub(crate) fn write_u32_be(buf: &mut [u8], n: u32) {
    BE::write_u32(buf, n)
}

/// Read an exact big-endian `u32` from a reader, translating a clean EOF
/// (zero bytes available) into `Ok(None)` so callers can distinguish "no
/// more chunks" from "chunk header cut off mid-read".
pub(crate) fn io_read_u32_be<R: io::Read>(rdr: &mut R) -> crate::Result<Option<u32>> {
    let mut buf = [0u8; 4];
    if !read_exact_eof(rdr, &mut buf)? {
        return Ok(None);
    }
    Ok(Some(BE::read_u32(&buf)))
}

/// Like [`io_read_u32_be`], but little-endian and always required (a clean
/// EOF here is itself an error, since this is only called mid-chunk).
pub(crate) fn io_read_u32_le<R: io::Read>(rdr: &mut R) -> crate::Result<u32> {
    let mut buf = [0u8; 4];
    rdr.read_exact(&mut buf).map_err(Error::from)?;
    Ok(LE::read_u32(&buf))
}

/// Decompress one Snappy block for a format codec, growing `dst` to fit.
///
/// Failures here are reported as [`Error::DecodeFailure`] rather than the
/// raw block codec's [`Error::Corrupt`]: a corrupt chunk payload inside a
/// stream format is a framing-layer concern (spec'd separately), even
/// though today it's detected by the same underlying block decoder.
pub(crate) fn decode_block(
    dec: &mut crate::decompress::Decoder,
    src: &[u8],
    dst: &mut Vec<u8>,
) -> crate::Result<()> {
    let dn = crate::decompress::decompress_len(src).map_err(|_| Error::DecodeFailure)?;
    dst.resize(dn, 0);
    dec.decompress(src, dst).map_err(|_| Error::DecodeFailure)?;
    Ok(())
}

/// `Read::read_exact`, except a clean EOF (no bytes read at all) returns
/// `Ok(false)` instead of an error. A partial read followed by EOF is still
/// an error: that's a truncated chunk, not the end of the stream.
pub(crate) fn read_exact_eof<R: io::Read>(rdr: &mut R, buf: &mut [u8]) -> crate::Result<bool> {
    if buf.is_empty() {
        return Ok(true);
    }
    let mut n = 0;
    loop {
        match rdr.read(&mut buf[n..]) {
            Ok(0) => {
                return if n == 0 {
                    Ok(false)
                } else {
                    Err(Error::UnexpectedEof)
                };
            }
            Ok(read) => {
                n += read;
                if n == buf.len() {
                    return Ok(true);
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from(e)),
        }
    }
}
