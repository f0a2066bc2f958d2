//! Session loop: render, read a key, dispatch.
//!
//! The loop is fully synchronous. Each iteration renders one frame in a
//! single write, blocks in the key decoder until a key arrives (each device
//! read is bounded by the raw-mode timeout), and applies the key to the
//! [`EditorState`].
//!
//! Ctrl-Q ends the session: the screen is erased, the cursor homed, and
//! [`Session::run`] returns. Restoring the terminal's line discipline is not
//! done here; it belongs to the raw-mode guard held by the caller.
//!
//! The loop is generic over its input and output so it can be driven with
//! scripted bytes:
//!
//! ```
//! use kilo_editor::session::Session;
//! use kilo_editor::state::{EditorState, Position};
//! use kilo_term::terminal::Size;
//!
//! let state = EditorState::new(Size { rows: 24, cols: 80 });
//! let mut session = Session::new(state, &b"\x1b[B\x1b[C\x11"[..], Vec::new());
//! session.run()?;
//! assert_eq!(session.state().cursor(), Position { x: 1, y: 1 });
//! # Ok::<(), kilo_term::Error>(())
//! ```

use std::io::Write;

use kilo_term::error::Result;
use kilo_term::input::{Key, KeyDecoder};
use kilo_term::tty::ByteSource;

use crate::render;
use crate::state::EditorState;

/// The key that ends the session.
pub const QUIT_KEY: Key = Key::ctrl(b'q');

/// What the loop does after a key has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep running.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Apply one key to the editor state.
pub fn dispatch(state: &mut EditorState, key: Key) -> Action {
    if key == QUIT_KEY {
        return Action::Quit;
    }
    let moved = state.move_cursor(key);
    tracing::trace!(?key, moved, cursor = ?state.cursor(), "key dispatched");
    Action::Continue
}

/// A running editor session.
#[derive(Debug)]
pub struct Session<S, W> {
    state: EditorState,
    keys: KeyDecoder<S>,
    out: W,
}

impl<S: ByteSource, W: Write> Session<S, W> {
    /// Create a session over `input` and `output`.
    pub const fn new(state: EditorState, input: S, output: W) -> Self {
        Self {
            state,
            keys: KeyDecoder::new(input),
            out: output,
        }
    }

    /// The editor state.
    pub const fn state(&self) -> &EditorState {
        &self.state
    }

    /// The output sink.
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Run until the quit key.
    ///
    /// # Errors
    ///
    /// Returns the first read or write error. The screen is left as it was;
    /// clearing it on the way out is the caller's job.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? == Action::Continue {}

        tracing::debug!("quit requested");
        render::clear_screen(&mut self.out)
    }

    /// One iteration: render a frame, read one key, dispatch it.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame write or the key read fails.
    pub fn step(&mut self) -> Result<Action> {
        render::refresh_screen(&self.state, &mut self.out)?;
        let key = self.keys.read_key()?;
        Ok(dispatch(&mut self.state, key))
    }
}
