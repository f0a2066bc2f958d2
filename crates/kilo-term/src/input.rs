// SPDX-License-Identifier: MIT
//
// Key decoding.
//
// Turns the raw byte stream from the terminal into one logical key per call.
// Ordinary bytes (printable or control) pass through untouched. ESC opens a
// small state machine that looks ahead at most three bytes to recognize the
// navigation keys terminals encode as escape sequences:
//
//   ESC [ A/B/C/D          arrows
//   ESC [ H / ESC [ F      Home / End
//   ESC O H / ESC O F      Home / End (application cursor mode)
//   ESC [ 1|7 ~            Home
//   ESC [ 4|8 ~            End
//   ESC [ 5 ~ / ESC [ 6 ~  PageUp / PageDown
//
// Every lookahead read is bounded by the terminal's read timeout, so a lone
// Escape press resolves to `Key::Escape` after one timeout instead of hanging.
// Anything the table does not recognize also resolves to `Key::Escape`.
// Decoding never fails on content; only a device read error is an error.

use std::fmt;

use crate::error::{Error, Result};
use crate::tty::ByteSource;

/// The escape byte.
pub const ESC: u8 = 0x1b;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A logical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A single byte, printable or control (Ctrl-Q arrives as `Byte(0x11)`).
    Byte(u8),
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
    /// A lone Escape press, or an escape sequence we do not recognize.
    Escape,
}

impl Key {
    /// The byte a terminal sends for Ctrl + `c`.
    ///
    /// Ctrl clears bits 5 and 6, so `ctrl(b'q')` is `0x11`.
    #[inline]
    #[must_use]
    pub const fn ctrl(c: u8) -> Self {
        Self::Byte(c & 0x1f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(b) if b.is_ascii_control() => write!(f, "{b}"),
            Self::Byte(b) => write!(f, "{b} ('{}')", char::from(*b)),
            Self::ArrowUp => f.write_str("ArrowUp"),
            Self::ArrowDown => f.write_str("ArrowDown"),
            Self::ArrowLeft => f.write_str("ArrowLeft"),
            Self::ArrowRight => f.write_str("ArrowRight"),
            Self::Home => f.write_str("Home"),
            Self::End => f.write_str("End"),
            Self::PageUp => f.write_str("PageUp"),
            Self::PageDown => f.write_str("PageDown"),
            Self::Escape => f.write_str("Escape"),
        }
    }
}

// ─── KeyDecoder ──────────────────────────────────────────────────────────────

/// Produces one [`Key`] per call from a [`ByteSource`].
///
/// # Example
///
/// ```
/// use kilo_term::input::{Key, KeyDecoder};
///
/// let mut keys = KeyDecoder::new(&b"\x1b[Ax"[..]);
/// assert_eq!(keys.read_key()?, Key::ArrowUp);
/// assert_eq!(keys.read_key()?, Key::Byte(b'x'));
/// # Ok::<(), kilo_term::Error>(())
/// ```
#[derive(Debug)]
pub struct KeyDecoder<S> {
    source: S,
}

impl<S: ByteSource> KeyDecoder<S> {
    /// Wrap a byte source.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Block until a key arrives, then decode it.
    ///
    /// Read timeouts while waiting for the first byte are retried; this is
    /// the poll loop of the session. Timeouts inside an escape sequence end
    /// the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the device read fails.
    pub fn read_key(&mut self) -> Result<Key> {
        loop {
            if let Some(key) = self.poll_key()? {
                return Ok(key);
            }
        }
    }

    /// Like [`read_key`](Self::read_key), but gives up after one read
    /// timeout with no input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the device read fails.
    pub fn poll_key(&mut self) -> Result<Option<Key>> {
        match self.next()? {
            None => Ok(None),
            Some(ESC) => self.decode_escape().map(Some),
            Some(b) => Ok(Some(Key::Byte(b))),
        }
    }

    /// Decode the bytes after an ESC that has already been consumed.
    fn decode_escape(&mut self) -> Result<Key> {
        let Some(prefix) = self.next()? else {
            return Ok(Key::Escape);
        };
        let Some(payload) = self.next()? else {
            return Ok(Key::Escape);
        };

        // Tilde sequences carry one more byte. Consume it for every digit
        // so an unmapped `ESC [ 3 ~` cannot leak a literal `~`.
        if prefix == b'[' && payload.is_ascii_digit() {
            return Ok(match self.next()? {
                Some(b'~') => tilde_key(payload),
                _ => Key::Escape,
            });
        }

        Ok(match (prefix, payload) {
            (b'[', b'A') => Key::ArrowUp,
            (b'[', b'B') => Key::ArrowDown,
            (b'[', b'C') => Key::ArrowRight,
            (b'[', b'D') => Key::ArrowLeft,
            (b'[' | b'O', b'H') => Key::Home,
            (b'[' | b'O', b'F') => Key::End,
            _ => Key::Escape,
        })
    }

    fn next(&mut self) -> Result<Option<u8>> {
        self.source.read_byte().map_err(Error::Read)
    }
}

/// Map the digit of `ESC [ <digit> ~` to its key.
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Escape,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
