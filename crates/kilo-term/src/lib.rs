// SPDX-License-Identifier: MIT
//
// kilo-term: terminal device layer for kilo.
//
// Everything between the editor and the terminal device: switching the line
// discipline into raw mode and back, measuring the window, decoding input
// bytes into keys, and getting each frame onto the screen in one write.
//
// No TUI framework sits underneath. Raw mode is plain termios, the window size
// is TIOCGWINSZ with an escape-sequence fallback, and the only escape
// sequences emitted are the handful of VT100 ones in `ansi`.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
#[cfg(unix)]
pub mod terminal;
pub mod tty;

pub use error::{Error, Result};
