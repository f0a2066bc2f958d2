//! Frame rendering.
//!
//! Every frame is composed into a fresh [`OutputBuffer`] and flushed with a
//! single write, in this order:
//!
//! 1. hide the cursor (so it doesn't flicker across the screen mid-draw)
//! 2. home the cursor
//! 3. one segment per row: the content, `ESC [ K`, and `\r\n` between rows
//! 4. place the cursor at its logical position
//! 5. show the cursor
//!
//! There is no text buffer, so every row shows the `~` placeholder except the
//! row one third of the way down, which carries the welcome banner.

use std::io::Write;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use kilo_term::ansi;
use kilo_term::error::{Error, Result};
use kilo_term::output::OutputBuffer;

use crate::state::EditorState;

/// Version shown in the welcome banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The welcome banner text.
#[must_use]
pub fn welcome_message() -> String {
    format!("Kilo editor -- version {VERSION}")
}

/// Compose one frame for `state` into a fresh buffer.
#[must_use]
pub fn compose_frame(state: &EditorState) -> OutputBuffer {
    let mut out = OutputBuffer::new();
    let welcome = welcome_message();

    // Writes into an OutputBuffer are infallible.
    let _ = ansi::cursor_hide(&mut out);
    let _ = ansi::cursor_home(&mut out);
    draw_rows(state, &welcome, &mut out);
    let cursor = state.cursor();
    let _ = ansi::cursor_to(&mut out, cursor.x, cursor.y);
    let _ = ansi::cursor_show(&mut out);
    out
}

/// Compose a frame for `state` and send it to `w` in one write.
///
/// # Errors
///
/// Returns [`Error::Write`] if the device write fails.
pub fn refresh_screen(state: &EditorState, w: &mut impl Write) -> Result<()> {
    let frame = compose_frame(state);
    tracing::trace!(bytes = frame.len(), "flushing frame");
    frame.flush_to(w).map_err(Error::Write)
}

/// Erase the whole screen and home the cursor, in one write.
///
/// # Errors
///
/// Returns [`Error::Write`] if the device write fails.
pub fn clear_screen(w: &mut impl Write) -> Result<()> {
    let mut out = OutputBuffer::with_capacity(8);
    let _ = ansi::clear_screen(&mut out);
    let _ = ansi::cursor_home(&mut out);
    out.flush_to(w).map_err(Error::Write)
}

fn draw_rows(state: &EditorState, welcome: &str, out: &mut OutputBuffer) {
    let screen = state.screen();
    let banner_row = screen.rows / 3;

    for y in 0..screen.rows {
        if y == banner_row {
            draw_banner(welcome, usize::from(screen.cols), out);
        } else {
            out.append(b"~");
        }

        let _ = ansi::clear_to_eol(out);
        if y + 1 < screen.rows {
            out.append(b"\r\n");
        }
    }
}

/// Draw `text` centered in a row of `width` columns, truncated to fit.
///
/// The left padding starts with the row's `~` marker when there is room.
fn draw_banner(text: &str, width: usize, out: &mut OutputBuffer) {
    let shown = truncate_to_width(text, width);
    let mut padding = (width - shown.width()) / 2;

    if padding > 0 {
        out.append(b"~");
        padding -= 1;
    }
    for _ in 0..padding {
        out.append(b" ");
    }
    out.append(shown.as_bytes());
}

/// The longest prefix of `text` that fits in `width` columns without
/// splitting a grapheme cluster.
fn truncate_to_width(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut end = 0;
    for (idx, grapheme) in text.grapheme_indices(true) {
        let w = grapheme.width();
        if used + w > width {
            break;
        }
        used += w;
        end = idx + grapheme.len();
    }
    &text[..end]
}
