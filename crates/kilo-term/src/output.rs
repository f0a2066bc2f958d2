// SPDX-License-Identifier: MIT
//
// Frame output buffering.
//
// OutputBuffer accumulates every byte of a frame (escape sequences and
// screen content alike) so the whole frame reaches the terminal in a single
// write() call. Interleaving partial writes across frame phases is what makes
// terminals tear and flicker; one write per frame makes that impossible.
//
// The buffer lives for exactly one frame: `flush_to` consumes it.
//
// Growth is fallible. If the allocator refuses to grow the buffer, the append
// is dropped and a warning is logged. The frame comes out incomplete, the next
// frame starts from a fresh buffer, and the session keeps running.

use std::io::{self, Write};

/// A byte buffer that accumulates one frame for a single `write()` call.
///
/// Default capacity: 4 KB, enough for a typical 80×24 frame without
/// reallocation.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    /// Bytes dropped because the buffer could not grow.
    dropped: usize,
}

const DEFAULT_CAPACITY: usize = 4096;

impl OutputBuffer {
    /// Create an empty buffer with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty buffer with room for `capacity` bytes.
    ///
    /// An allocation failure here leaves the buffer empty; growth is retried
    /// on the first append.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::new();
        let _ = buf.try_reserve(capacity);
        Self { buf, dropped: 0 }
    }

    /// Append `bytes` to the end of the buffer.
    ///
    /// If the buffer cannot grow, the bytes are discarded and counted in
    /// [`dropped`](Self::dropped).
    pub fn append(&mut self, bytes: &[u8]) {
        if self.reserve(bytes.len()) {
            self.buf.extend_from_slice(bytes);
        }
    }

    /// Make room for `additional` bytes, recording them as dropped on failure.
    fn reserve(&mut self, additional: usize) -> bool {
        if self.buf.try_reserve(additional).is_ok() {
            return true;
        }
        self.dropped = self.dropped.saturating_add(additional);
        tracing::warn!(
            len = additional,
            buffered = self.buf.len(),
            "output buffer could not grow; dropping append"
        );
        false
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of bytes discarded because growth failed.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Discard the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
        self.dropped = 0;
    }

    /// Write the whole frame to `w` in one call, then drop the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails.
    pub fn flush_to(self, w: &mut impl Write) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        w.write_all(&self.buf)?;
        w.flush()
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. The real flush is flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
