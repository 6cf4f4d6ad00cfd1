//! Screen grid (spec component C3): a grid of rows with its own cursor,
//! current pen, and saved-cursor slot. Scroll-region-aware scrolling and
//! newline semantics live one level up, in [`crate::terminal::Terminal`];
//! this module only knows about its own row list and column count.

use tracing::debug;

use crate::cell::{Cell, Color, TextAttributes};
use crate::row::{padding_style, Row};

/// Cursor position plus the bits that travel with it: the overflow flag
/// (pending wrap) and the DEC Special Graphics (line-drawing) charset
/// designation, which spec.md's DECSC save list (§4.5) groups with cursor
/// state rather than with terminal-wide modes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorState {
    pub row: u16,
    pub col: u16,
    pub overflow: bool,
    pub line_drawing: bool,
}

/// What DECSC/mode-1048 saves: cursor position, charset state, pen, and the
/// origin-mode/wraparound bits spec.md §4.5 lists alongside them (those two
/// live on `Terminal::modes`, out of `Screen`'s reach, so the caller passes
/// them in and gets them back out on restore). spec.md's Data Model (§3)
/// lists "two saved option slots" on a Screen; per the Open Question in §9
/// ("the source executes saveOptions twice; treat as single-save"), both
/// DECSC and mode-1048 write/read the same slot here rather than two
/// independent ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedCursor {
    pub cursor: CursorState,
    pub pen: TextAttributes,
    pub origin_mode: bool,
    pub wraparound: bool,
}

#[derive(Debug, Clone)]
pub struct Screen {
    rows: Vec<Row>,
    pub column_count: u16,
    pub cursor: CursorState,
    pub pen: TextAttributes,
    saved: Option<SavedCursor>,
}

impl Screen {
    pub fn new(columns: u16, row_count: u16) -> Self {
        Self {
            rows: (0..row_count).map(|_| Row::new(columns)).collect(),
            column_count: columns,
            cursor: CursorState::default(),
            pen: TextAttributes::default(),
            saved: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn cursor_row(&self) -> &Row {
        &self.rows[self.cursor.row as usize]
    }

    fn cursor_row_mut(&mut self) -> &mut Row {
        let r = self.cursor.row as usize;
        &mut self.rows[r]
    }

    /// Clamp to `[0, column_count]` x `[0, row_count)`, per spec.md §4.3.
    /// Clears the overflow bit, since any explicit positioning resolves a
    /// pending wrap.
    pub fn set_cursor(&mut self, row: i64, col: i64) {
        let max_row = self.rows.len().saturating_sub(1) as i64;
        let clamped_row = row.clamp(0, max_row);
        let clamped_col = col.clamp(0, self.column_count as i64);
        if clamped_row != row || clamped_col != col {
            debug!(requested_row = row, requested_col = col, "cursor position clamped");
        }
        self.cursor.row = clamped_row as u16;
        self.cursor.col = clamped_col as u16;
        self.cursor.overflow = false;
    }

    pub fn cursor_up(&mut self, n: u16) {
        let target = self.cursor.row.saturating_sub(n);
        self.set_cursor(target as i64, self.cursor.col as i64);
    }

    pub fn cursor_down(&mut self, n: u16) {
        let target = self.cursor.row.saturating_add(n);
        self.set_cursor(target as i64, self.cursor.col as i64);
    }

    pub fn cursor_left(&mut self, n: u16) {
        let target = self.cursor.col.saturating_sub(n);
        self.set_cursor(self.cursor.row as i64, target as i64);
    }

    pub fn cursor_right(&mut self, n: u16) {
        let target = self.cursor.col.saturating_add(n);
        self.set_cursor(self.cursor.row as i64, target as i64);
    }

    pub fn clear_cursor_row(&mut self) {
        let bg = self.pen.bg;
        self.cursor_row_mut().erase_with_bg(bg);
    }

    /// Append a row at the bottom.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Remove and return the last row.
    pub fn pop_row(&mut self) -> Option<Row> {
        self.rows.pop()
    }

    /// Remove and return the first (topmost) row. Used when transferring
    /// rows into scrollback.
    pub fn shift_row(&mut self) -> Option<Row> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.rows.remove(0))
        }
    }

    /// Insert a row at the top.
    pub fn unshift_row(&mut self, row: Row) {
        self.rows.insert(0, row);
    }

    /// Insert `n` blank rows at `self.cursor.row`, bounded by `[top, bottom]`
    /// (inclusive); rows pushed past `bottom` are discarded. This implements
    /// IL and the scroll-region-bounded half of `vt_scroll_up`.
    pub fn insert_lines(&mut self, top: usize, bottom: usize, n: usize) {
        let anchor = (self.cursor.row as usize).clamp(top, bottom);
        let bottom = bottom.min(self.rows.len().saturating_sub(1));
        if anchor > bottom {
            return;
        }
        let n = n.min(bottom - anchor + 1);
        for _ in 0..n {
            self.rows.remove(bottom);
            self.rows.insert(anchor, Row::new(self.column_count));
        }
    }

    /// Remove `n` rows starting at `self.cursor.row`, bounded by
    /// `[top, bottom]`; blank rows are appended at `bottom` to keep the
    /// region's height constant. Implements DL and `vt_scroll_down`.
    pub fn delete_lines(&mut self, top: usize, bottom: usize, n: usize) {
        let anchor = (self.cursor.row as usize).clamp(top, bottom);
        let bottom = bottom.min(self.rows.len().saturating_sub(1));
        if anchor > bottom {
            return;
        }
        let n = n.min(bottom - anchor + 1);
        for _ in 0..n {
            self.rows.remove(anchor);
            self.rows.insert(bottom, Row::new(self.column_count));
        }
    }

    /// Insert `text` at the cursor column, shifting the rest of the row
    /// right. Returns any cells clipped off the row end (spec.md §4.2).
    pub fn insert_string(&mut self, text: &str) -> Vec<Cell> {
        let (col, pen) = (self.cursor.col as usize, self.pen);
        self.cursor_row_mut().insert(col, text, pen)
    }

    /// Overwrite `text` at the cursor column, padding any gap between the
    /// prior logical end and the cursor with style-stripped spaces per
    /// spec.md §4.2's whitespace padding rule.
    pub fn overwrite_string(&mut self, text: &str) {
        let (col, pen) = (self.cursor.col as usize, self.pen);
        self.cursor_row_mut().overwrite(col, text, pen);
    }

    /// Pad `[from, to)` with default-background spaces carrying only
    /// fg/bold from `pen`, never bg/underline/strikethrough.
    pub fn pad_gap(&mut self, from: usize, to: usize) {
        if to <= from {
            return;
        }
        let pen = padding_style(self.pen);
        let pad = " ".repeat(to - from);
        self.cursor_row_mut().overwrite(from, &pad, pen);
    }

    pub fn delete_chars(&mut self, n: usize) {
        let col = self.cursor.col as usize;
        self.cursor_row_mut().delete_chars(col, n);
    }

    pub fn insert_blanks(&mut self, n: usize) {
        let col = self.cursor.col as usize;
        self.cursor_row_mut().insert_blanks(col, n);
    }

    pub fn erase_to_left(&mut self) {
        let (col, bg) = (self.cursor.col as usize, self.pen.bg);
        self.cursor_row_mut().erase(0, col + 1, bg);
    }

    pub fn erase_to_right(&mut self) {
        let (col, bg) = (self.cursor.col as usize, self.pen.bg);
        let width = self.column_count as usize;
        self.cursor_row_mut().erase(col, width - col.min(width), bg);
    }

    pub fn erase_above(&mut self) {
        let (row, col, bg) = (self.cursor.row as usize, self.cursor.col as usize, self.pen.bg);
        for r in self.rows.iter_mut().take(row) {
            r.erase_with_bg(bg);
        }
        self.rows[row].erase(0, col + 1, bg);
    }

    pub fn erase_below(&mut self) {
        let (row, col, bg) = (self.cursor.row as usize, self.cursor.col as usize, self.pen.bg);
        let width = self.column_count as usize;
        self.rows[row].erase(col, width - col.min(width), bg);
        for r in self.rows.iter_mut().skip(row + 1) {
            r.erase_with_bg(bg);
        }
    }

    pub fn erase_all(&mut self) {
        let bg = self.pen.bg;
        for r in &mut self.rows {
            r.erase_with_bg(bg);
        }
    }

    pub fn erase_all_hard(&mut self) {
        for r in &mut self.rows {
            r.clear();
        }
    }

    /// Save cursor position, charset state, pen, and the caller's current
    /// origin-mode/wraparound bits (the single-save slot; see
    /// [`SavedCursor`]).
    pub fn save_options(&mut self, origin_mode: bool, wraparound: bool) {
        self.saved = Some(SavedCursor {
            cursor: self.cursor,
            pen: self.pen,
            origin_mode,
            wraparound,
        });
    }

    /// Restore a previously saved cursor/pen, returning the saved
    /// origin-mode/wraparound bits for the caller to apply back onto its
    /// mode state. A no-op on cursor/pen if nothing was saved (xterm resets
    /// to home in that case, which is already the default); returns `None`
    /// in that case so the caller leaves its mode bits untouched.
    pub fn restore_options(&mut self) -> Option<(bool, bool)> {
        if let Some(saved) = self.saved {
            self.cursor = saved.cursor;
            self.pen = saved.pen;
            Some((saved.origin_mode, saved.wraparound))
        } else {
            self.cursor = CursorState::default();
            self.pen = TextAttributes::default();
            None
        }
    }

    pub fn has_saved_options(&self) -> bool {
        self.saved.is_some()
    }

    /// Resize the row width (DECCOLM / host resize). Existing rows are
    /// resized in place; the cursor is re-clamped.
    pub fn set_column_count(&mut self, cols: u16) {
        self.column_count = cols;
        for r in &mut self.rows {
            r.resize(cols);
        }
        self.set_cursor(self.cursor.row as i64, self.cursor.col as i64);
    }

    /// Resize the row count, growing with blank rows or shrinking from the
    /// bottom. Scrollback-aware shrink/grow (drawing rows back from the
    /// ring) is handled by [`crate::terminal::Terminal::resize`]; this only
    /// adjusts the local row list.
    pub fn set_row_count(&mut self, rows: u16) {
        let rows = rows as usize;
        match rows.cmp(&self.rows.len()) {
            std::cmp::Ordering::Greater => {
                while self.rows.len() < rows {
                    self.rows.push(Row::new(self.column_count));
                }
            }
            std::cmp::Ordering::Less => {
                self.rows.truncate(rows.max(1));
            }
            std::cmp::Ordering::Equal => {}
        }
        self.set_cursor(self.cursor.row as i64, self.cursor.col as i64);
    }

    pub fn fill_default_bg(&self) -> Color {
        self.pen.bg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cursor_clamps_and_clears_overflow() {
        let mut screen = Screen::new(10, 5);
        screen.cursor.overflow = true;
        screen.set_cursor(100, -5);
        assert_eq!(screen.cursor.row, 4);
        assert_eq!(screen.cursor.col, 0);
        assert!(!screen.cursor.overflow);
    }

    #[test]
    fn insert_lines_pushes_bottom_rows_out_of_region() {
        let mut screen = Screen::new(4, 4);
        for (i, text) in ["aaaa", "bbbb", "cccc", "dddd"].iter().enumerate() {
            screen.row_mut(i).unwrap().overwrite(0, text, TextAttributes::default());
        }
        screen.cursor.row = 1;
        screen.insert_lines(0, 3, 1);
        assert_eq!(screen.row(0).unwrap().full_text(), "aaaa");
        assert_eq!(screen.row(1).unwrap().full_text(), "    ");
        assert_eq!(screen.row(2).unwrap().full_text(), "bbbb");
        assert_eq!(screen.row(3).unwrap().full_text(), "cccc");
    }

    #[test]
    fn delete_lines_pulls_rows_up_and_pads_bottom() {
        let mut screen = Screen::new(4, 4);
        for (i, text) in ["aaaa", "bbbb", "cccc", "dddd"].iter().enumerate() {
            screen.row_mut(i).unwrap().overwrite(0, text, TextAttributes::default());
        }
        screen.cursor.row = 1;
        screen.delete_lines(0, 3, 1);
        assert_eq!(screen.row(0).unwrap().full_text(), "aaaa");
        assert_eq!(screen.row(1).unwrap().full_text(), "cccc");
        assert_eq!(screen.row(2).unwrap().full_text(), "dddd");
        assert_eq!(screen.row(3).unwrap().full_text(), "    ");
    }

    #[test]
    fn save_restore_single_slot_round_trips() {
        let mut screen = Screen::new(10, 5);
        screen.set_cursor(2, 3);
        screen.pen.flags = crate::cell::CellAttrs::BOLD;
        screen.save_options(true, false);
        screen.set_cursor(0, 0);
        screen.pen = TextAttributes::default();
        let restored = screen.restore_options();
        assert_eq!(screen.cursor.row, 2);
        assert_eq!(screen.cursor.col, 3);
        assert!(screen.pen.flags.contains(crate::cell::CellAttrs::BOLD));
        assert_eq!(restored, Some((true, false)));
    }
}
