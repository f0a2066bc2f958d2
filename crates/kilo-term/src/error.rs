// SPDX-License-Identifier: MIT
//
// Error taxonomy for the device layer.
//
// Every variant here is fatal to a session. The two deliberate leniencies
// (unrecognized escape sequences, a failed output-buffer reservation) never
// produce an error at all, so they have no variant.

use std::io;

use thiserror::Error;

/// Errors raised while configuring, probing, reading or writing the terminal.
#[derive(Debug, Error)]
pub enum Error {
    // ── Device configuration ────────────────────────────────────────
    /// Reading the current line-discipline settings failed.
    #[error("tcgetattr: {0}")]
    GetAttr(#[source] io::Error),

    /// Applying line-discipline settings failed.
    #[error("tcsetattr: {0}")]
    SetAttr(#[source] io::Error),

    /// The original configuration was already captured earlier in this process.
    #[error("terminal configuration already captured in this process")]
    AlreadyCaptured,

    // ── Geometry ────────────────────────────────────────────────────
    /// The cursor-position fallback could not talk to the device.
    #[error("window size: {0}")]
    WindowSize(#[source] io::Error),

    /// The cursor-position reply was malformed or incomplete.
    #[error("malformed cursor position report: {0:?}")]
    CursorReport(Vec<u8>),

    // ── I/O ─────────────────────────────────────────────────────────
    /// Reading input failed for a reason other than the read timeout.
    #[error("read: {0}")]
    Read(#[source] io::Error),

    /// Writing a frame to the output device failed.
    #[error("write: {0}")]
    Write(#[source] io::Error),
}

/// Result alias for device-layer operations.
pub type Result<T> = std::result::Result<T, Error>;
