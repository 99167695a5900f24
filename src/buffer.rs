//! A pair of resizable buffers sized for one block's worst-case compressed
//! expansion.
//!
//! Every format codec needs somewhere to decompress/compress a block into
//! before framing it; `WorkBuffer` is that somewhere. It owns no file
//! descriptors and carries no format-specific knowledge, so it's shared
//! across all of [`crate::formats`] rather than duplicated per codec.

use crate::compress::max_compress_len;

/// `{ uc, c }` where `c.len() >= max_compress_len(uc.len())`.
///
/// Buffers only ever grow (never shrink) across calls to [`WorkBuffer::resize_uc`]
/// / [`WorkBuffer::resize_c`], mirroring the "grow on demand, never shrink"
/// policy of the systems it's modeled on. A `WorkBuffer` is never shared
/// across threads; each codec invocation owns one for the lifetime of a
/// single `compress`/`decompress` call.
pub(crate) struct WorkBuffer {
    pub(crate) uc: Vec<u8>,
    pub(crate) c: Vec<u8>,
}

impl WorkBuffer {
    /// Allocate a work buffer sized for blocks of at most `block_size`
    /// uncompressed bytes.
    pub(crate) fn new(block_size: usize) -> WorkBuffer {
        WorkBuffer {
            uc: vec![0; block_size],
            c: vec![0; max_compress_len(block_size)],
        }
    }

    /// Grow the uncompressed-side buffer to at least `new_len` bytes.
    /// A no-op if it's already that big or bigger.
    pub(crate) fn resize_uc(&mut self, new_len: usize) {
        if new_len > self.uc.len() {
            self.uc.resize(new_len, 0);
        }
    }

    /// Grow the compressed-side buffer to at least `new_len` bytes.
    pub(crate) fn resize_c(&mut self, new_len: usize) {
        if new_len > self.c.len() {
            self.c.resize(new_len, 0);
        }
    }
}
