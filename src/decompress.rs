use byteorder::{ByteOrder, LittleEndian as LE};

use crate::{read_varu64, Error, Result, MAX_INPUT_SIZE};

/// A Snappy block decompressor.
///
/// A `Decoder` carries no state between calls to [`decompress`](Decoder::decompress);
/// it exists so that callers that decompress many blocks in a row (stream
/// readers, for example) have a single place to hang future reusable scratch
/// space without changing their call sites.
#[derive(Clone, Debug, Default)]
pub struct Decoder {
    _private: (),
}

impl Decoder {
    /// Create a new decoder.
    pub fn new() -> Decoder {
        Decoder { _private: () }
    }

    /// Decompress the Snappy block `input` into `output`, returning the
    /// number of bytes written.
    ///
    /// `output` must be at least [`decompress_len`]`(input)` bytes long.
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        decompress(input, output)
    }

    /// Decompress the Snappy block `input`, allocating a fresh buffer of
    /// exactly the right size to hold the result.
    pub fn decompress_vec(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut buf = vec![0; decompress_len(input)?];
        self.decompress(input, &mut buf)?;
        Ok(buf)
    }
}

/// Decompress the Snappy block `input` into `output`, returning the number
/// of bytes written.
///
/// `output` must be at least [`decompress_len`]`(input)` bytes long, or this
/// returns [`Error::BufferTooSmall`].
pub fn decompress(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if input.is_empty() {
        return Ok(0);
    }

    let hdr = Header::read(input)?;
    if hdr.decompress_len > output.len() {
        return Err(Error::BufferTooSmall {
            given: output.len() as u64,
            min: hdr.decompress_len as u64,
        });
    }
    let output = &mut output[..hdr.decompress_len];
    decompress_block(&input[hdr.len..], output)?;
    Ok(output.len())
}

/// Return the number of bytes that the Snappy block `input` will expand to
/// when decompressed, without doing the actual decompression work.
pub fn decompress_len(input: &[u8]) -> Result<usize> {
    if input.is_empty() {
        return Ok(0);
    }
    Ok(Header::read(input)?.decompress_len)
}

/// A safe, portable (no `unsafe`) tag-byte dispatch loop over the Snappy
/// block format: every tag byte's low two bits select literal (`00`), a
/// 1-byte-offset copy (`01`), a 2-byte-offset copy (`10`) or a 4-byte-offset
/// copy (`11`), per the public Snappy format description.
fn decompress_block(mut input: &[u8], output: &mut [u8]) -> Result<()> {
    let mut d = 0usize;
    while !input.is_empty() {
        let tag = input[0];
        input = &input[1..];
        match tag & 0b0000_0011 {
            0b00 => {
                let (lit_len, consumed) = literal_len(tag, input)?;
                input = &input[consumed..];
                if lit_len > input.len() || d + lit_len > output.len() {
                    return Err(Error::Corrupt);
                }
                output[d..d + lit_len].copy_from_slice(&input[..lit_len]);
                d += lit_len;
                input = &input[lit_len..];
            }
            0b01 => {
                if input.is_empty() {
                    return Err(Error::Corrupt);
                }
                let len = ((tag >> 2) & 0b111) as usize + 4;
                let offset = (((tag >> 5) as usize) << 8) | input[0] as usize;
                input = &input[1..];
                copy(output, &mut d, offset, len)?;
            }
            0b10 => {
                if input.len() < 2 {
                    return Err(Error::Corrupt);
                }
                let len = (tag >> 2) as usize + 1;
                let offset = LE::read_u16(input) as usize;
                input = &input[2..];
                copy(output, &mut d, offset, len)?;
            }
            _ => {
                if input.len() < 4 {
                    return Err(Error::Corrupt);
                }
                let len = (tag >> 2) as usize + 1;
                let offset = LE::read_u32(input) as usize;
                input = &input[4..];
                copy(output, &mut d, offset, len)?;
            }
        }
    }
    if d != output.len() {
        return Err(Error::Corrupt);
    }
    Ok(())
}

/// Decode a literal tag's length, reading any extension-length bytes from
/// the front of `input`. Returns `(length, bytes_of_input_consumed)`.
fn literal_len(tag: u8, input: &[u8]) -> Result<(usize, usize)> {
    let len = (tag >> 2) as usize;
    if len < 60 {
        return Ok((len + 1, 0));
    }
    let extra_bytes = len - 59;
    if input.len() < extra_bytes {
        return Err(Error::Corrupt);
    }
    let mut n: usize = 0;
    for i in 0..extra_bytes {
        n |= (input[i] as usize) << (8 * i);
    }
    Ok((n + 1, extra_bytes))
}

/// Copy `len` bytes from `offset` bytes back in `output` (relative to `*d`)
/// to the current position `*d`, advancing `*d` by `len`. The source and
/// destination ranges may overlap, as is required to express run-length
/// repeats.
fn copy(output: &mut [u8], d: &mut usize, offset: usize, len: usize) -> Result<()> {
    if offset == 0 || offset > *d {
        return Err(Error::Corrupt);
    }
    let end = *d + len;
    if end > output.len() {
        return Err(Error::Corrupt);
    }
    let mut src = *d - offset;
    let mut dst = *d;
    for _ in 0..len {
        output[dst] = output[src];
        src += 1;
        dst += 1;
    }
    *d = end;
    Ok(())
}

struct Header {
    /// The length of the header in bytes (i.e., the varint).
    len: usize,
    /// The length of the original decompressed input in bytes.
    decompress_len: usize,
}

impl Header {
    fn read(input: &[u8]) -> Result<Header> {
        let (decompress_len, header_len) = read_varu64(input);
        if header_len == 0 {
            return Err(Error::Corrupt);
        }
        if decompress_len > MAX_INPUT_SIZE {
            return Err(Error::TooBig {
                given: decompress_len,
                max: MAX_INPUT_SIZE,
            });
        }
        Ok(Header {
            len: header_len,
            decompress_len: decompress_len as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;
    use crate::compress::max_compress_len;

    fn roundtrip(data: &[u8]) {
        let mut c = vec![0; max_compress_len(data.len())];
        let n = compress(data, &mut c).unwrap();
        c.truncate(n);
        let mut d = vec![0; decompress_len(&c).unwrap()];
        let n = decompress(&c, &mut d).unwrap();
        assert_eq!(&d[..n], data);
    }

    #[test]
    fn empty() {
        roundtrip(b"");
    }

    #[test]
    fn short_literal() {
        roundtrip(b"hello world");
    }

    #[test]
    fn long_repeated() {
        roundtrip(&vec![b'z'; 1 << 20]);
    }

    #[test]
    fn truncated_header_is_corrupt() {
        assert!(decompress_len(&[0xff]).is_err());
    }

    #[test]
    fn copy_past_start_is_corrupt() {
        // A copy tag (2-byte offset, len=1) claiming to reach back further
        // than any output produced so far.
        let mut header = [0u8; 10];
        let n = crate::write_varu64(&mut header, 5);
        let mut block = header[..n].to_vec();
        block.push(0b10 | (0 << 2));
        block.extend_from_slice(&[0xff, 0xff]);
        let mut out = [0u8; 5];
        assert!(matches!(decompress(&block, &mut out), Err(Error::Corrupt)));
    }
}
