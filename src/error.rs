use std::fmt;
use std::io;
use std::result;

/// A convenient type alias for `Result<T, snzip::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// `IntoInnerError` occurs when consuming an encoder fails.
///
/// Consuming the encoder causes a flush to happen. If the flush fails, then
/// this error is returned, which contains both the original encoder and the
/// error that occurred.
///
/// The type parameter `W` is the unconsumed writer.
pub struct IntoInnerError<W> {
    wtr: W,
    err: io::Error,
}

impl<W> IntoInnerError<W> {
    pub(crate) fn new(wtr: W, err: io::Error) -> IntoInnerError<W> {
        IntoInnerError { wtr, err }
    }

    /// Returns the error which caused the call to `into_inner` to fail.
    pub fn error(&self) -> &io::Error {
        &self.err
    }

    /// Returns the error which caused the call to `into_inner` to fail.
    pub fn into_error(self) -> io::Error {
        self.err
    }

    /// Returns the underlying writer which generated the error.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}

impl<W: std::any::Any> std::error::Error for IntoInnerError<W> {}

impl<W> fmt::Display for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl<W> fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

/// `Error` describes every way that compression or decompression can fail,
/// whether in the raw block codec or in any of the stream container
/// formats.
///
/// Most callers won't need to match on the specific variant; all of them
/// indicate either corrupt/unsupported input or a limitation that cannot be
/// worked around. `From<snzip::Error> for std::io::Error` is provided so
/// that any of these can be propagated with `?` from an `io::Read`/`Write`
/// implementation.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The given input is too big for the raw Snappy block format (its
    /// encoded length header wouldn't fit in a `u32`).
    TooBig {
        /// The size of the given input.
        given: u64,
        /// The maximum allowed size of an input buffer.
        max: u64,
    },
    /// The given output buffer is too small to contain the maximum possible
    /// compressed bytes or the total number of decompressed bytes.
    BufferTooSmall {
        /// The size of the given output buffer.
        given: u64,
        /// The minimum size of the output buffer.
        min: u64,
    },
    /// The raw Snappy block format's header or body is corrupt.
    Corrupt,
    /// The underlying I/O source failed while being read.
    Io(io::Error),
    /// The stream ended in the middle of a header or a length-prefixed
    /// chunk payload, as opposed to cleanly at a chunk boundary.
    UnexpectedEof,
    /// A fixed magic/header byte sequence did not match what a format
    /// expects.
    InvalidMagic {
        /// The name of the format whose magic bytes failed to match.
        format: &'static str,
    },
    /// A header version (or compatible-version) field was not one this
    /// decoder understands.
    InvalidVersion {
        /// The name of the format reporting the error.
        format: &'static str,
        /// The version value that was read.
        version: u32,
    },
    /// A chunk was malformed: an unsupported/unskippable chunk type, a
    /// length field that is internally inconsistent (e.g. too short to
    /// hold the checksum it claims to carry), or a length that exceeds a
    /// format-defined bound.
    InvalidChunk {
        /// The name of the format reporting the error.
        format: &'static str,
        /// A short, human-readable description of what was wrong.
        reason: &'static str,
    },
    /// A chunk's computed masked CRC32C disagreed with the value recorded
    /// in the stream.
    ChecksumMismatch {
        /// The checksum recorded in the stream.
        expected: u32,
        /// The checksum computed over the decompressed payload.
        got: u32,
    },
    /// The Snappy block decompressor rejected a chunk's payload as
    /// corrupt.
    DecodeFailure,
    /// An uncompressed length exceeded a format-defined bound: either the
    /// format's own declared maximum, or (for `hadoop-snappy`) the
    /// remaining bytes promised by the enclosing record.
    SizeOverflow {
        /// The name of the format reporting the error.
        format: &'static str,
    },
    /// Allocating a work buffer failed.
    OutOfMemory,
}

impl Error {
    pub(crate) fn invalid_chunk(format: &'static str, reason: &'static str) -> Error {
        Error::InvalidChunk { format, reason }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(err)
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            Error::UnexpectedEof => {
                io::Error::new(io::ErrorKind::UnexpectedEof, "snzip: unexpected EOF")
            }
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooBig { given, max } => write!(
                f,
                "snzip: input buffer (size = {}) is larger than allowed (size = {})",
                given, max
            ),
            Error::BufferTooSmall { given, min } => write!(
                f,
                "snzip: output buffer (size = {}) is smaller than required (size = {})",
                given, min
            ),
            Error::Corrupt => write!(f, "snzip: corrupt raw snappy block"),
            Error::Io(err) => write!(f, "snzip: I/O error: {}", err),
            Error::UnexpectedEof => write!(f, "snzip: unexpected end of file"),
            Error::InvalidMagic { format } => {
                write!(f, "snzip: invalid {} stream header", format)
            }
            Error::InvalidVersion { format, version } => write!(
                f,
                "snzip: unknown {} format version {}",
                format, version
            ),
            Error::InvalidChunk { format, reason } => {
                write!(f, "snzip: invalid {} chunk: {}", format, reason)
            }
            Error::ChecksumMismatch { expected, got } => write!(
                f,
                "snzip: CRC32C mismatch (expected 0x{:08x}, got 0x{:08x})",
                expected, got
            ),
            Error::DecodeFailure => write!(f, "snzip: snappy block decompression failed"),
            Error::SizeOverflow { format } => {
                write!(f, "snzip: {} uncompressed size exceeds bound", format)
            }
            Error::OutOfMemory => write!(f, "snzip: out of memory"),
        }
    }
}
