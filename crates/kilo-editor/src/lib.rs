//! kilo-editor: session layer for kilo.
//!
//! Holds the editor state (cursor and screen geometry), renders it into
//! frames, and runs the render → read key → dispatch loop on top of the
//! device layer in `kilo-term`.

pub mod inspect;
pub mod render;
pub mod session;
pub mod state;
