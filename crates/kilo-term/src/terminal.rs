// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, window size, and restore-on-exit.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr) and ioctl (TIOCGWINSZ). These are the standard POSIX interfaces
// for terminal control, and there is no safe alternative. Each unsafe block
// is minimal.
#![allow(unsafe_code)]
//
// Raw mode is a scoped resource. `RawMode::enable` captures the original
// line-discipline settings, applies the raw variant, and hands back a guard.
// Dropping the guard puts the original settings back. That covers normal
// return, the quit key, and every `?` on an error path.
//
// Panics get the same treatment through a hook installed on first enable.
// The hook and the guard restore from one shared slot and each *takes* the
// snapshot out of it, so whichever runs first restores and the other finds
// nothing to do. The original settings are applied exactly once.
//
// The snapshot is captured at most once per process. A second `enable`
// fails with `Error::AlreadyCaptured` rather than silently snapshotting a
// terminal that may already be raw.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once, PoisonError};
use std::time::Duration;

use crate::ansi;
use crate::error::{Error, Result};
use crate::tty::{ByteSource, TtyWriter};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── TermConfig ─────────────────────────────────────────────────────────────

/// A snapshot of a terminal's line-discipline settings.
#[derive(Clone, Copy)]
pub struct TermConfig {
    termios: libc::termios,
}

impl TermConfig {
    /// Read the current settings of `fd`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GetAttr`] if `fd` is not a terminal or the query fails.
    pub fn read(fd: libc::c_int) -> Result<Self> {
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(Error::GetAttr(io::Error::last_os_error()));
        }
        Ok(Self { termios })
    }

    /// Apply these settings to `fd`, discarding pending input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetAttr`] if the settings cannot be applied.
    pub fn apply(&self, fd: libc::c_int) -> Result<()> {
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const self.termios) } != 0 {
            return Err(Error::SetAttr(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Derive the raw-mode variant of these settings.
    ///
    /// Input: no flow control (IXON), no CR→NL (ICRNL), no break→SIGINT
    /// (BRKINT), no parity check (INPCK), no 8th-bit strip (ISTRIP).
    /// Output: no post-processing (OPOST). Control: 8-bit characters (CS8).
    /// Local: no echo, no canonical input, no Ctrl-V (IEXTEN), no signals.
    ///
    /// Reads return as soon as one byte is available (VMIN = 0) or after
    /// `timeout_ds` tenths of a second with nothing (VTIME).
    #[must_use]
    pub fn raw(&self, timeout_ds: u8) -> Self {
        let mut t = self.termios;
        t.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        t.c_oflag &= !libc::OPOST;
        t.c_cflag &= !libc::CSIZE;
        t.c_cflag |= libc::CS8;
        t.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        t.c_cc[libc::VMIN] = 0;
        t.c_cc[libc::VTIME] = timeout_ds;
        Self { termios: t }
    }

    /// Whether two snapshots configure the terminal identically.
    ///
    /// Compares the four flag words and the control characters. Padding and
    /// platform-private fields are ignored.
    #[must_use]
    pub fn same_settings(&self, other: &Self) -> bool {
        let (a, b) = (&self.termios, &other.termios);
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }

    /// Minimum bytes a read waits for.
    #[must_use]
    pub const fn vmin(&self) -> u8 {
        self.termios.c_cc[libc::VMIN]
    }

    /// Read timeout in tenths of a second.
    #[must_use]
    pub const fn vtime(&self) -> u8 {
        self.termios.c_cc[libc::VTIME]
    }

    /// Input flags (`c_iflag`).
    #[must_use]
    pub const fn input_flags(&self) -> libc::tcflag_t {
        self.termios.c_iflag
    }

    /// Output flags (`c_oflag`).
    #[must_use]
    pub const fn output_flags(&self) -> libc::tcflag_t {
        self.termios.c_oflag
    }

    /// Control flags (`c_cflag`).
    #[must_use]
    pub const fn control_flags(&self) -> libc::tcflag_t {
        self.termios.c_cflag
    }

    /// Local flags (`c_lflag`).
    #[must_use]
    pub const fn local_flags(&self) -> libc::tcflag_t {
        self.termios.c_lflag
    }
}

impl From<libc::termios> for TermConfig {
    fn from(termios: libc::termios) -> Self {
        Self { termios }
    }
}

impl fmt::Debug for TermConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TermConfig")
            .field("iflag", &format_args!("{:#x}", self.termios.c_iflag))
            .field("oflag", &format_args!("{:#x}", self.termios.c_oflag))
            .field("cflag", &format_args!("{:#x}", self.termios.c_cflag))
            .field("lflag", &format_args!("{:#x}", self.termios.c_lflag))
            .field("vmin", &self.vmin())
            .field("vtime", &self.vtime())
            .finish()
    }
}

/// Convert a read timeout to VTIME deciseconds: rounded up, clamped to 1..=255.
#[must_use]
pub fn timeout_deciseconds(timeout: Duration) -> u8 {
    let ds = timeout.as_millis().div_ceil(100).clamp(1, 255);
    u8::try_from(ds).unwrap_or(u8::MAX)
}

// ─── Restore slot ───────────────────────────────────────────────────────────

/// The original settings and the descriptor they belong to.
#[derive(Clone, Copy)]
struct Snapshot {
    fd: libc::c_int,
    config: TermConfig,
}

/// Set once the original settings have been captured.
static CAPTURED: AtomicBool = AtomicBool::new(false);

/// The pending restore, shared by the guard and the panic hook.
static ORIGINAL: Mutex<Option<Snapshot>> = Mutex::new(None);

/// Panic hook guard, ensuring the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Sent by the panic hook before restoring termios: clear, home, show cursor.
const PANIC_SCREEN_RESET: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Take the pending snapshot (if any) and apply it.
///
/// Returns `Ok(false)` if there was nothing left to restore.
fn restore_original() -> Result<bool> {
    let snapshot = ORIGINAL
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    match snapshot {
        Some(s) => s.config.apply(s.fd).map(|()| true),
        None => Ok(false),
    }
}

/// Restore the pending snapshot on the panic path.
///
/// The screen reset goes out only if this call restored the terminal. A panic
/// after the guard has already restored leaves the shell screen alone.
fn restore_for_panic(screen: &mut impl Write) -> bool {
    match restore_original() {
        Ok(true) => {
            let _ = screen.write_all(PANIC_SCREEN_RESET);
            true
        }
        Ok(false) | Err(_) => false,
    }
}

/// Install a panic hook that restores the terminal and resets the screen
/// before the default handler prints the panic message.
///
/// The reset goes through [`TtyWriter`], a bare `libc::write` on fd 1, so it
/// does not block on the stdout lock if the panic happened while it was held.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_for_panic(&mut TtyWriter::stdout());
            original(info);
        }));
    });
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode guard. The original terminal settings come back on drop.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use kilo_term::terminal::RawMode;
///
/// let raw = RawMode::enable(libc::STDIN_FILENO, Duration::from_millis(100))?;
/// // ... read keys, render frames ...
/// raw.disable()?; // or just let it drop
/// # Ok::<(), kilo_term::Error>(())
/// ```
#[derive(Debug)]
pub struct RawMode {
    fd: libc::c_int,
    active: bool,
}

impl RawMode {
    /// Capture the settings of `fd` and switch it to raw mode.
    ///
    /// # Errors
    ///
    /// - [`Error::GetAttr`] if `fd` is not a terminal.
    /// - [`Error::AlreadyCaptured`] if raw mode was enabled before in this
    ///   process.
    /// - [`Error::SetAttr`] if the raw settings cannot be applied. The
    ///   original settings stay in effect.
    pub fn enable(fd: libc::c_int, read_timeout: Duration) -> Result<Self> {
        let original = TermConfig::read(fd)?;

        if CAPTURED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyCaptured);
        }

        *ORIGINAL.lock().unwrap_or_else(PoisonError::into_inner) = Some(Snapshot {
            fd,
            config: original,
        });
        install_panic_hook();

        let raw = original.raw(timeout_deciseconds(read_timeout));
        if let Err(e) = raw.apply(fd) {
            let _ = ORIGINAL.lock().unwrap_or_else(PoisonError::into_inner).take();
            return Err(e);
        }

        tracing::debug!(fd, ?original, ?raw, "raw mode enabled");
        Ok(Self { fd, active: true })
    }

    /// The file descriptor this guard controls.
    #[must_use]
    pub const fn fd(&self) -> libc::c_int {
        self.fd
    }

    /// Restore the original settings now and report the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SetAttr`] if the original settings cannot be applied.
    pub fn disable(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if restore_original()? {
            tracing::debug!(fd = self.fd, "terminal settings restored");
        }
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!(fd = self.fd, error = %e, "failed to restore terminal settings");
        }
    }
}

// ─── Window size ────────────────────────────────────────────────────────────

/// Query the window size of `fd` via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if the query fails or reports zero rows or columns.
#[must_use]
pub fn query_size(fd: libc::c_int) -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

/// Longest cursor-position reply we accept: `ESC [ 65535 ; 65535 R` is 15.
const REPORT_MAX: usize = 32;

/// Determine the terminal size, falling back to a cursor-position probe.
///
/// Asks the driver first. If that fails, moves the cursor to the far
/// bottom-right corner and asks the terminal where it ended up.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] or [`Error::CursorReport`] if the fallback
/// probe fails.
pub fn window_size(
    fd: libc::c_int,
    input: &mut impl ByteSource,
    output: &mut impl Write,
) -> Result<Size> {
    if let Some(size) = query_size(fd) {
        return Ok(size);
    }
    tracing::debug!(fd, "TIOCGWINSZ unavailable; probing cursor position");
    probe_size(input, output)
}

/// Measure the terminal by parking the cursor in the far corner and reading
/// back its position.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if writing the probe or reading the reply
/// fails, and [`Error::CursorReport`] if the reply is malformed.
pub fn probe_size(input: &mut impl ByteSource, output: &mut impl Write) -> Result<Size> {
    let mut probe = Vec::with_capacity(16);
    ansi::cursor_far_corner(&mut probe).map_err(Error::WindowSize)?;
    ansi::request_cursor_position(&mut probe).map_err(Error::WindowSize)?;
    output.write_all(&probe).map_err(Error::WindowSize)?;
    output.flush().map_err(Error::WindowSize)?;

    let mut reply = Vec::with_capacity(REPORT_MAX);
    while reply.len() < REPORT_MAX {
        match input.read_byte().map_err(Error::WindowSize)? {
            Some(b) => {
                reply.push(b);
                if b == b'R' {
                    break;
                }
            }
            None => break,
        }
    }

    parse_cursor_report(&reply)
}

/// Parse a cursor-position report `ESC [ rows ; cols R`.
///
/// The whole buffer must be exactly one report. Missing prefix, missing
/// terminator, empty or zero numbers, and trailing bytes are all errors.
///
/// # Errors
///
/// Returns [`Error::CursorReport`] carrying the offending bytes.
pub fn parse_cursor_report(reply: &[u8]) -> Result<Size> {
    let malformed = || Error::CursorReport(reply.to_vec());

    let body = reply
        .strip_prefix(b"\x1b[")
        .and_then(|rest| rest.strip_suffix(b"R"))
        .ok_or_else(malformed)?;

    let (rows, rest) = parse_u16(body).ok_or_else(malformed)?;
    let rest = rest.strip_prefix(b";").ok_or_else(malformed)?;
    let (cols, rest) = parse_u16(rest).ok_or_else(malformed)?;

    if !rest.is_empty() || rows == 0 || cols == 0 {
        return Err(malformed());
    }
    Ok(Size { rows, cols })
}

/// Parse a non-empty run of ASCII digits into a `u16`.
/// Returns `(value, remaining_bytes)`, or `None` on no digits or overflow.
fn parse_u16(buf: &[u8]) -> Option<(u16, &[u8])> {
    let digits = buf.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let mut val: u16 = 0;
    for &b in &buf[..digits] {
        val = val.checked_mul(10)?.checked_add(u16::from(b - b'0'))?;
    }
    Some((val, &buf[digits..]))
}

/// Check whether `fd` is connected to a terminal.
#[must_use]
pub fn is_tty(fd: libc::c_int) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
