/*!
The raw Snappy block format: a single buffer in, a single buffer out, no
framing whatsoever.

This is the lowest-level thing this crate exposes. Most callers want
[`crate::read`]/[`crate::write`] (the canonical frame format) or
[`crate::formats`] (any of the other containers) instead; reach for `raw`
only when interoperating with something that emits bare Snappy blocks with
no chunking, checksum, or header at all.

[`formats::Format::Raw`](crate::formats::Format::Raw) wraps this same
primitive behind the common `compress`/`decompress` contract, buffering an
entire stream into memory since the raw format has no block boundaries of
its own to frame around.
*/
pub use crate::compress::{compress, max_compress_len, Encoder};
pub use crate::decompress::{decompress, decompress_len, Decoder};
