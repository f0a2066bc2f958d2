//! Editor state: cursor position and screen geometry.
//!
//! One `EditorState` exists per session. It is created at startup from the
//! probed window size, owned by the session loop, and lent by reference to
//! the renderer (read) and to key dispatch (write). Nothing else holds it.
//!
//! # Invariant
//!
//! After every mutation the cursor lies on the screen:
//! `x < screen.cols` and `y < screen.rows`. Every movement clamps at the
//! edges, so pressing an arrow into a wall is a no-op rather than an error.

use kilo_term::input::Key;
use kilo_term::terminal::Size;

/// A cell position on screen, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

/// Session state shared by the renderer and key dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    cursor: Position,
    screen: Size,
}

impl EditorState {
    /// Create a state for a screen of `screen` cells with the cursor at the
    /// top-left corner.
    ///
    /// A zero dimension is bumped to 1 so the cursor always has a cell.
    #[must_use]
    pub fn new(screen: Size) -> Self {
        Self {
            cursor: Position::default(),
            screen: Size {
                rows: screen.rows.max(1),
                cols: screen.cols.max(1),
            },
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Current cursor position.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Position {
        self.cursor
    }

    /// Screen dimensions.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> Size {
        self.screen
    }

    const fn last_col(&self) -> u16 {
        self.screen.cols - 1
    }

    const fn last_row(&self) -> u16 {
        self.screen.rows - 1
    }

    // -- Movement -----------------------------------------------------------

    /// Apply a navigation key. Returns `false` for keys that do not move the
    /// cursor (they are left alone entirely).
    pub fn move_cursor(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowLeft => self.cursor.x = self.cursor.x.saturating_sub(1),
            Key::ArrowRight => self.cursor.x = (self.cursor.x + 1).min(self.last_col()),
            Key::ArrowUp => self.cursor.y = self.cursor.y.saturating_sub(1),
            Key::ArrowDown => self.cursor.y = (self.cursor.y + 1).min(self.last_row()),
            Key::Home => self.cursor.x = 0,
            Key::End => self.cursor.x = self.last_col(),
            Key::PageUp | Key::PageDown => {
                let step = if key == Key::PageUp {
                    Key::ArrowUp
                } else {
                    Key::ArrowDown
                };
                for _ in 0..self.screen.rows {
                    self.move_cursor(step);
                }
            }
            Key::Byte(_) | Key::Escape => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn state(rows: u16, cols: u16) -> EditorState {
        EditorState::new(Size { rows, cols })
    }

    fn at(s: &mut EditorState, x: u16, y: u16) {
        s.cursor = Position { x, y };
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn starts_at_origin() {
        let s = state(24, 80);
        assert_eq!(s.cursor(), Position { x: 0, y: 0 });
        assert_eq!(s.screen(), Size { rows: 24, cols: 80 });
    }

    #[test]
    fn zero_screen_is_bumped() {
        assert_eq!(state(0, 0).screen(), Size { rows: 1, cols: 1 });
    }

    // -- Arrows -------------------------------------------------------------

    #[test]
    fn arrows_move_one_cell() {
        let mut s = state(24, 80);
        at(&mut s, 5, 5);
        s.move_cursor(Key::ArrowRight);
        s.move_cursor(Key::ArrowDown);
        assert_eq!(s.cursor(), Position { x: 6, y: 6 });
        s.move_cursor(Key::ArrowLeft);
        s.move_cursor(Key::ArrowUp);
        assert_eq!(s.cursor(), Position { x: 5, y: 5 });
    }

    #[test]
    fn left_edge_clamps() {
        let mut s = state(24, 80);
        s.move_cursor(Key::ArrowLeft);
        assert_eq!(s.cursor().x, 0);
    }

    #[test]
    fn right_edge_clamps() {
        let mut s = state(24, 80);
        at(&mut s, 79, 0);
        s.move_cursor(Key::ArrowRight);
        assert_eq!(s.cursor().x, 79);
    }

    #[test]
    fn top_edge_clamps() {
        let mut s = state(24, 80);
        s.move_cursor(Key::ArrowUp);
        assert_eq!(s.cursor().y, 0);
    }

    #[test]
    fn bottom_edge_clamps() {
        let mut s = state(24, 80);
        at(&mut s, 0, 23);
        s.move_cursor(Key::ArrowDown);
        assert_eq!(s.cursor().y, 23);
    }

    #[test]
    fn single_cell_screen_never_moves() {
        let mut s = state(1, 1);
        for key in [Key::ArrowRight, Key::ArrowDown, Key::End, Key::PageDown] {
            s.move_cursor(key);
            assert_eq!(s.cursor(), Position::default());
        }
    }

    // -- Home / End ---------------------------------------------------------

    #[test]
    fn home_goes_to_first_column() {
        let mut s = state(24, 80);
        at(&mut s, 40, 7);
        s.move_cursor(Key::Home);
        assert_eq!(s.cursor(), Position { x: 0, y: 7 });
    }

    #[test]
    fn end_goes_to_last_column() {
        let mut s = state(24, 80);
        at(&mut s, 3, 7);
        s.move_cursor(Key::End);
        assert_eq!(s.cursor(), Position { x: 79, y: 7 });
    }

    // -- Paging -------------------------------------------------------------

    #[test]
    fn page_down_from_top_hits_bottom() {
        let mut s = state(24, 80);
        s.move_cursor(Key::PageDown);
        assert_eq!(s.cursor().y, 23);
    }

    #[test]
    fn page_up_from_bottom_hits_top() {
        let mut s = state(24, 80);
        at(&mut s, 10, 23);
        s.move_cursor(Key::PageUp);
        assert_eq!(s.cursor(), Position { x: 10, y: 0 });
    }

    #[test]
    fn page_keys_leave_column_alone() {
        let mut s = state(24, 80);
        at(&mut s, 33, 12);
        s.move_cursor(Key::PageDown);
        assert_eq!(s.cursor().x, 33);
    }

    // -- Non-movement keys --------------------------------------------------

    #[test]
    fn other_keys_are_ignored() {
        let mut s = state(24, 80);
        at(&mut s, 4, 4);
        assert!(!s.move_cursor(Key::Byte(b'x')));
        assert!(!s.move_cursor(Key::Escape));
        assert_eq!(s.cursor(), Position { x: 4, y: 4 });
    }

    // -- Properties ---------------------------------------------------------

    fn any_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            Just(Key::ArrowUp),
            Just(Key::ArrowDown),
            Just(Key::ArrowLeft),
            Just(Key::ArrowRight),
            Just(Key::Home),
            Just(Key::End),
            Just(Key::PageUp),
            Just(Key::PageDown),
            Just(Key::Escape),
            any::<u8>().prop_map(Key::Byte),
        ]
    }

    proptest! {
        #[test]
        fn cursor_stays_on_screen(
            rows in 1u16..200,
            cols in 1u16..300,
            keys in proptest::collection::vec(any_key(), 0..64),
        ) {
            let mut s = state(rows, cols);
            for key in keys {
                s.move_cursor(key);
                prop_assert!(s.cursor().x < cols);
                prop_assert!(s.cursor().y < rows);
            }
        }

        #[test]
        fn page_moves_by_screen_height(
            rows in 1u16..200,
            start in 0u16..200,
            down in any::<bool>(),
        ) {
            let mut s = state(rows, 80);
            let y = start.min(rows - 1);
            at(&mut s, 0, y);

            let (key, expected) = if down {
                (Key::PageDown, y.saturating_add(rows).min(rows - 1))
            } else {
                (Key::PageUp, y.saturating_sub(rows))
            };
            s.move_cursor(key);
            prop_assert_eq!(s.cursor().y, expected);
        }

        #[test]
        fn clamped_moves_are_idempotent(rows in 1u16..100, cols in 1u16..100) {
            let mut s = state(rows, cols);
            at(&mut s, cols - 1, rows - 1);
            let corner = s.cursor();
            s.move_cursor(Key::ArrowRight);
            s.move_cursor(Key::ArrowDown);
            prop_assert_eq!(s.cursor(), corner);
        }
    }
}
