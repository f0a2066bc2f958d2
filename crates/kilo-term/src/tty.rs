// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte-level terminal I/O.
//
// Reads are synchronous and bounded. Raw mode sets VMIN=0 / VTIME=n, so a
// `read()` on the terminal returns one byte as soon as it arrives, or zero
// bytes once the read timeout expires. `ByteSource::read_byte` surfaces that
// as `Ok(None)`: a timeout is an ordinary outcome, not an error. The key
// decoder relies on it to tell a lone Escape press from the start of an
// escape sequence.
//
// Writes go straight to the file descriptor with `libc::write`, bypassing
// Rust's line-buffered stdout. A frame written with one `write_all` call is
// one syscall unless the kernel accepts only part of it.

use std::io;

// ─── ByteSource ──────────────────────────────────────────────────────────────

/// A byte-at-a-time input stream with a bounded read timeout.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// Returns `Ok(None)` if no byte arrived within the read timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails for any other reason.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// Scripted input: yields the slice's bytes in order, then times out forever.
impl ByteSource for &[u8] {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        match self.split_first() {
            Some((&b, rest)) => {
                *self = rest;
                Ok(Some(b))
            }
            None => Ok(None),
        }
    }
}

// ─── TtyReader ───────────────────────────────────────────────────────────────

/// Reads single bytes from a terminal file descriptor.
///
/// The timeout behavior comes from the terminal configuration (see
/// [`RawMode`](crate::terminal::RawMode)), not from this type.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct TtyReader {
    fd: libc::c_int,
}

#[cfg(unix)]
impl TtyReader {
    /// Reader over standard input.
    #[must_use]
    pub const fn stdin() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
        }
    }

    /// Reader over an arbitrary terminal file descriptor.
    #[must_use]
    pub const fn from_fd(fd: libc::c_int) -> Self {
        Self { fd }
    }

    /// The underlying file descriptor.
    #[must_use]
    pub const fn fd(&self) -> libc::c_int {
        self.fd
    }
}

#[cfg(unix)]
impl ByteSource for TtyReader {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                // EAGAIN shows up instead of a zero-byte read on some
                // platforms; EINTR means a signal (e.g. SIGWINCH) cut the
                // wait short. Both mean "nothing yet".
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

// ─── TtyWriter ───────────────────────────────────────────────────────────────

/// Unbuffered writer over a terminal file descriptor.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct TtyWriter {
    fd: libc::c_int,
}

#[cfg(unix)]
impl TtyWriter {
    /// Writer over standard output.
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            fd: libc::STDOUT_FILENO,
        }
    }

    /// Writer over an arbitrary terminal file descriptor.
    #[must_use]
    pub const fn from_fd(fd: libc::c_int) -> Self {
        Self { fd }
    }

    /// The underlying file descriptor.
    #[must_use]
    pub const fn fd(&self) -> libc::c_int {
        self.fd
    }
}

#[cfg(unix)]
impl io::Write for TtyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Nothing is buffered on our side.
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Scripted source ─────────────────────────────────────────────

    #[test]
    fn slice_yields_bytes_in_order() {
        let mut src: &[u8] = b"ab";
        assert_eq!(src.read_byte().unwrap(), Some(b'a'));
        assert_eq!(src.read_byte().unwrap(), Some(b'b'));
    }

    #[test]
    fn exhausted_slice_times_out() {
        let mut src: &[u8] = b"";
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.read_byte().unwrap(), None);
    }

    #[test]
    fn mut_ref_forwards() {
        fn first<S: ByteSource>(mut s: S) -> Option<u8> {
            s.read_byte().unwrap()
        }

        let mut src: &[u8] = b"xy";
        assert_eq!(first(&mut src), Some(b'x'));
        assert_eq!(src, b"y");
    }

    // ── File descriptors ────────────────────────────────────────────

    #[cfg(unix)]
    fn pipe() -> (libc::c_int, libc::c_int) {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        (fds[0], fds[1])
    }

    #[cfg(unix)]
    fn close(fd: libc::c_int) {
        unsafe {
            libc::close(fd);
        }
    }

    #[cfg(unix)]
    #[test]
    fn writer_and_reader_over_pipe() {
        use std::io::Write;

        let (rd, wr) = pipe();
        let mut w = TtyWriter::from_fd(wr);
        w.write_all(b"\x1b[A").unwrap();
        close(wr);

        let mut r = TtyReader::from_fd(rd);
        assert_eq!(r.read_byte().unwrap(), Some(0x1b));
        assert_eq!(r.read_byte().unwrap(), Some(b'['));
        assert_eq!(r.read_byte().unwrap(), Some(b'A'));
        // Write end closed: read() returns 0, which reads as a timeout.
        assert_eq!(r.read_byte().unwrap(), None);
        close(rd);
    }

    #[cfg(unix)]
    #[test]
    fn reader_reports_bad_fd() {
        let mut r = TtyReader::from_fd(-1);
        assert!(r.read_byte().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn writer_reports_bad_fd() {
        use std::io::Write;
        let mut w = TtyWriter::from_fd(-1);
        assert!(w.write(b"x").is_err());
    }
}
