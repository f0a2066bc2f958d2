//! Key inspector. Prints every decoded key, one per line.
//!
//! A diagnostic mode for checking what a terminal actually sends. Plain
//! bytes print as their decimal value, with the character alongside when it
//! is printable; named keys print by name. Output post-processing is off in
//! raw mode, so each line ends in an explicit `\r\n`.
//!
//! `q` or Ctrl-Q stops the inspector. The stop key itself is not printed.

use std::io::Write;

use kilo_term::error::{Error, Result};
use kilo_term::input::{Key, KeyDecoder};
use kilo_term::output::OutputBuffer;
use kilo_term::tty::ByteSource;

use crate::session::QUIT_KEY;

/// Decode keys from `input` and describe each on `out` until a stop key.
///
/// # Errors
///
/// Returns the first read or write error.
pub fn run(input: impl ByteSource, out: &mut impl Write) -> Result<()> {
    let mut keys = KeyDecoder::new(input);
    loop {
        let key = keys.read_key()?;
        if key == Key::Byte(b'q') || key == QUIT_KEY {
            return Ok(());
        }

        let mut line = OutputBuffer::with_capacity(24);
        let _ = write!(line, "{key}\r\n");
        line.flush_to(out).map_err(Error::Write)?;
    }
}
