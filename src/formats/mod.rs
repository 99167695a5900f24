/*!
The stream container formats built on top of the raw Snappy block codec.

Every format in this module implements the same small contract: a pull-based
`compress`/`decompress` pair over `std::io::Read`/`std::io::Write`. [`Format`]
is an enum-dispatch registry over all of them (the set is closed and known at
compile time, so there is no reason to reach for a trait object here), plus
[`Format::detect`] for identifying which one a stream starts with.
*/

use std::io::{Read, Write};

use crate::{Error, Result};

mod comment43;
mod framing;
mod framing2;
mod hadoop;
mod iwa;
mod snappy_in_java;
mod snappy_java;
mod snzip;

/// One of the stream container formats this crate can read or write.
///
/// Each variant owns an independent wire format; see the module
/// documentation on the corresponding submodule for its exact layout.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// `.sz`, the current canonical Snappy frame format (10-byte header).
    Framing2,
    /// The older 9-byte-header draft of the frame format.
    Framing,
    /// `.snz`, `kubo/snzip`'s varint-framed container.
    Snzip,
    /// `xerial/snappy-java`'s length-prefixed, checksum-less container.
    SnappyJava,
    /// `dain/snappy`'s `snappy-in-java` container.
    SnappyInJava,
    /// Hadoop's nested-record `.snappy` container.
    HadoopSnappy,
    /// The legacy `comment-43` container with an explicit end-of-stream
    /// chunk.
    Comment43,
    /// The chunked format used inside Apple iWork documents.
    Iwa,
    /// A single raw Snappy block with no framing at all.
    Raw,
}

/// Every format this crate knows, in a fixed order used by [`Format::by_name`]
/// and [`Format::by_suffix`] lookups.
const ALL: &[Format] = &[
    Format::Framing2,
    Format::Framing,
    Format::Snzip,
    Format::SnappyJava,
    Format::SnappyInJava,
    Format::HadoopSnappy,
    Format::Comment43,
    Format::Iwa,
    Format::Raw,
];

impl Format {
    /// All formats this crate supports, in a stable order.
    pub fn all() -> &'static [Format] {
        ALL
    }

    /// The format's canonical short name, as used by [`Format::by_name`].
    pub fn name(self) -> &'static str {
        match self {
            Format::Framing2 => "framing2",
            Format::Framing => "framing",
            Format::Snzip => "snzip",
            Format::SnappyJava => "snappy-java",
            Format::SnappyInJava => "snappy-in-java",
            Format::HadoopSnappy => "hadoop-snappy",
            Format::Comment43 => "comment-43",
            Format::Iwa => "iwa",
            Format::Raw => "raw",
        }
    }

    /// A URL documenting the format's origin, for diagnostics and `--help`
    /// text in downstream tools.
    pub fn url(self) -> &'static str {
        match self {
            Format::Framing2 | Format::Framing => {
                "https://github.com/google/snappy/blob/master/framing_format.txt"
            }
            Format::Snzip => "https://github.com/kubo/snzip",
            Format::SnappyJava => "https://github.com/xerial/snappy-java",
            Format::SnappyInJava => "https://github.com/dain/snappy",
            Format::HadoopSnappy => "https://github.com/apache/hadoop",
            Format::Comment43 => "https://github.com/google/snappy/blob/master/framing_format.txt",
            Format::Iwa => "https://github.com/obriensp/iWorkFileFormat",
            Format::Raw => "https://github.com/google/snappy",
        }
    }

    /// The conventional file suffix associated with this format, without
    /// the leading dot, or `None` for formats with no fixed convention.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Format::Framing2 | Format::Framing => Some("sz"),
            Format::Snzip => Some("snz"),
            Format::SnappyJava => Some("snappy"),
            Format::SnappyInJava => Some("snappy"),
            Format::HadoopSnappy => Some("snappy"),
            Format::Comment43 => None,
            Format::Iwa => Some("iwa"),
            Format::Raw => None,
        }
    }

    /// This format's default block size, used when `compress` is called
    /// with `block_size == 0`.
    pub fn default_block_size(self) -> usize {
        match self {
            Format::Framing2 | Format::Framing => 1 << 16,
            Format::Snzip => 1 << 16,
            Format::SnappyJava => 32 * 1024,
            Format::SnappyInJava => 32 * 1024,
            Format::HadoopSnappy => 256 * 1024,
            Format::Comment43 => 32 * 1024,
            Format::Iwa => 65536,
            Format::Raw => 0,
        }
    }

    /// The largest block size this format's header can express, or `None`
    /// if the format places no upper bound of its own on block size.
    pub fn max_block_size(self) -> Option<usize> {
        match self {
            Format::Snzip => Some(1 << 27),
            Format::SnappyInJava => Some(65535),
            Format::Iwa => Some(65536),
            _ => None,
        }
    }

    /// Look up a format by its [`Format::name`].
    pub fn by_name(name: &str) -> Option<Format> {
        ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Look up a format by a file suffix (without the leading dot). More
    /// than one format can share a suffix (`snappy-java`, `snappy-in-java`,
    /// and `hadoop-snappy` all conventionally use `snappy`); this returns
    /// the first match in [`Format::all`] order, which favors the more
    /// common interop format.
    pub fn by_suffix(suffix: &str) -> Option<Format> {
        ALL.iter().copied().find(|f| f.suffix() == Some(suffix))
    }

    /// Compress `reader` into `writer` using this format's framing.
    ///
    /// `block_size` of `0` selects [`Format::default_block_size`].
    pub fn compress<R: Read, W: Write>(self, reader: R, writer: W, block_size: usize) -> Result<()> {
        match self {
            Format::Framing2 => framing2::compress(reader, writer, block_size),
            Format::Framing => framing::compress(reader, writer, block_size),
            Format::Snzip => snzip::compress(reader, writer, block_size),
            Format::SnappyJava => snappy_java::compress(reader, writer, block_size),
            Format::SnappyInJava => snappy_in_java::compress(reader, writer, block_size),
            Format::HadoopSnappy => hadoop::compress(reader, writer, block_size),
            Format::Comment43 => comment43::compress(reader, writer, block_size),
            Format::Iwa => iwa::compress(reader, writer, block_size),
            Format::Raw => compress_raw(reader, writer),
        }
    }

    /// Decompress `reader` into `writer` using this format's framing.
    ///
    /// `skip_magic` is for use with [`Format::detect`]: when `detect` has
    /// already consumed and validated a format's header bytes from the same
    /// reader, pass `true` so `decompress` doesn't expect to see them again.
    /// Most callers pass `false`.
    pub fn decompress<R: Read, W: Write>(self, reader: R, writer: W, skip_magic: bool) -> Result<()> {
        match self {
            Format::Framing2 => framing2::decompress(reader, writer, skip_magic),
            Format::Framing => framing::decompress(reader, writer, skip_magic),
            Format::Snzip => snzip::decompress(reader, writer, skip_magic),
            Format::SnappyJava => snappy_java::decompress(reader, writer, skip_magic),
            Format::SnappyInJava => snappy_in_java::decompress(reader, writer, skip_magic),
            Format::HadoopSnappy => hadoop::decompress(reader, writer, skip_magic),
            Format::Comment43 => comment43::decompress(reader, writer, skip_magic),
            Format::Iwa => iwa::decompress(reader, writer, skip_magic),
            Format::Raw => decompress_raw(reader, writer),
        }
    }

    /// Identify the format a stream starts with by inspecting its leading
    /// bytes, consuming exactly the bytes needed to make that
    /// identification (never more).
    ///
    /// [`Format::HadoopSnappy`], [`Format::Iwa`], and [`Format::Raw`] have no
    /// distinguishing header and are never returned here; callers that need
    /// one of those must be told explicitly which format to use.
    ///
    /// On success, finish decompressing the same stream by calling
    /// `format.decompress(reader, writer, true)` on the very same reader --
    /// the bytes `detect` consumed are exactly the bytes that format's
    /// `decompress` expects `skip_magic` to mean it can skip.
    pub fn detect<R: Read>(mut reader: R) -> Result<Format> {
        let result = detect_from(&mut reader);
        match &result {
            Ok(format) => log::trace!("autodetected stream format: {}", format.name()),
            Err(err) => log::debug!("format autodetection failed: {}", err),
        }
        result
    }
}

fn read_one<R: Read>(reader: &mut R) -> Result<u8> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b).map_err(|_| Error::InvalidMagic { format: "autodetect" })?;
    Ok(b[0])
}

fn expect<R: Read>(reader: &mut R, want: &[u8]) -> Result<()> {
    let mut got = vec![0u8; want.len()];
    reader.read_exact(&mut got).map_err(|_| Error::InvalidMagic { format: "autodetect" })?;
    if got != want {
        return Err(Error::InvalidMagic { format: "autodetect" });
    }
    Ok(())
}

fn detect_from<R: Read>(reader: &mut R) -> Result<Format> {
    match read_one(reader)? {
        0xff => {
            expect(reader, &[0x06, 0x00])?;
            match read_one(reader)? {
                // framing2's header has an extra 0x00 before the "sNaPpY" body.
                0x00 => {
                    expect(reader, b"sNaPpY")?;
                    Ok(Format::Framing2)
                }
                b's' => match read_one(reader)? {
                    b'N' => {
                        expect(reader, b"aPpY")?;
                        Ok(Format::Framing)
                    }
                    b'n' => {
                        expect(reader, b"appy")?;
                        Ok(Format::Comment43)
                    }
                    _ => Err(Error::InvalidMagic { format: "autodetect" }),
                },
                _ => Err(Error::InvalidMagic { format: "autodetect" }),
            }
        }
        b'S' => {
            expect(reader, b"NZ")?;
            Ok(Format::Snzip)
        }
        0x82 => {
            expect(reader, b"SNAPPY\0")?;
            Ok(Format::SnappyJava)
        }
        b's' => {
            expect(reader, b"nappy\0")?;
            Ok(Format::SnappyInJava)
        }
        _ => Err(Error::InvalidMagic { format: "autodetect" }),
    }
}

/// `Format::Raw` has no block boundaries of its own, so the whole input is
/// buffered in memory and handed to the raw block codec in one call.
fn compress_raw<R: Read, W: Write>(mut reader: R, mut writer: W) -> Result<()> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input).map_err(Error::from)?;
    let mut output = vec![0u8; crate::compress::max_compress_len(input.len())];
    let n = crate::compress::compress(&input, &mut output)?;
    writer.write_all(&output[..n])?;
    Ok(())
}

fn decompress_raw<R: Read, W: Write>(mut reader: R, mut writer: W) -> Result<()> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input).map_err(Error::from)?;
    let n = crate::decompress::decompress_len(&input)?;
    let mut output = vec![0u8; n];
    crate::decompress::decompress(&input, &mut output)?;
    writer.write_all(&output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(format: Format, data: &[u8]) {
        let mut compressed = Vec::new();
        format.compress(data, &mut compressed, 0).unwrap();
        let mut out = Vec::new();
        format.decompress(&compressed[..], &mut out, false).unwrap();
        assert_eq!(out, data, "{:?} roundtrip", format);
    }

    #[test]
    fn roundtrips_every_format() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        for &format in Format::all() {
            roundtrip(format, &data);
        }
    }

    #[test]
    fn by_name_and_by_suffix_cover_all_formats() {
        for &format in Format::all() {
            assert_eq!(Format::by_name(format.name()), Some(format));
        }
        assert_eq!(Format::by_suffix("sz"), Some(Format::Framing2));
        assert_eq!(Format::by_suffix("snz"), Some(Format::Snzip));
        assert_eq!(Format::by_name("nonsense"), None);
    }

    #[test]
    fn detect_identifies_each_headered_format() {
        let data = b"detectable payload, detectable payload, detectable payload";
        let headered = [
            Format::Framing2,
            Format::Framing,
            Format::Snzip,
            Format::SnappyJava,
            Format::SnappyInJava,
            Format::Comment43,
        ];
        for &format in &headered {
            let mut compressed = Vec::new();
            format.compress(&data[..], &mut compressed, 0).unwrap();
            let mut cursor = &compressed[..];
            let detected = Format::detect(&mut cursor).unwrap();
            assert_eq!(detected, format);
            let mut out = Vec::new();
            detected.decompress(cursor, &mut out, true).unwrap();
            assert_eq!(out, data);
        }
    }

    #[test]
    fn detect_rejects_garbage() {
        let mut cursor = &b"not a snappy stream of any kind"[..];
        assert!(Format::detect(&mut cursor).is_err());
    }
}
