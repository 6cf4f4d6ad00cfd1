//! Row buffer (spec component C2).
//!
//! Rows store a fixed-length `Vec<Cell>` internally — like the teacher's
//! `Grid`/`Row` — rather than a literal run-length list; runs are computed
//! on demand via [`Row::styled_runs`] for the row-provider contract (§6) and
//! for [`Row::text`]. Every mutating operation honors the wide-character
//! severing rule from spec.md §4.2: cutting into a double-width glyph at
//! either edge of the affected range replaces the orphaned half with a
//! default-styled space.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use crate::cell::{Cell, CellAttrs, CellFlags, Color, TextAttributes, UnderlineStyle};

/// A single display line: a fixed-width sequence of cells.
#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub dirty: bool,
}

/// Split `text` into (grapheme, column-width) pieces. ASCII text (the
/// `U+0020..=U+007E` fast path from spec.md §4.2) skips grapheme
/// segmentation entirely since every ASCII byte is its own one-column
/// grapheme.
pub(crate) fn segment(text: &str) -> Vec<(String, u16)> {
    segment_text(text)
}

fn segment_text(text: &str) -> Vec<(String, u16)> {
    if text.is_ascii() {
        return text
            .chars()
            .map(|c| (c.to_string(), 1u16))
            .collect();
    }
    text.graphemes(true)
        .map(|g| {
            let width = g
                .chars()
                .next()
                .and_then(UnicodeWidthChar::width)
                .unwrap_or(1)
                .max(1) as u16;
            (g.to_string(), width.min(2))
        })
        .collect()
}

/// Strip background/underline/strikethrough from a style for use as
/// padding, per spec.md §4.2's whitespace padding rule: padding may inherit
/// foreground/bold but must never carry a visible background or decoration.
pub fn padding_style(style: TextAttributes) -> TextAttributes {
    let mut s = style;
    s.bg = Color::Default;
    s.underline_style = UnderlineStyle::None;
    s.flags.remove(CellAttrs::STRIKETHROUGH);
    s
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.dirty = true;
    }

    pub fn erase_with_bg(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.erase(bg);
        }
        self.dirty = true;
    }

    pub fn resize(&mut self, cols: u16) {
        let new_len = cols as usize;
        if self.cells.len() != new_len {
            // Resizing mid-row could leave a dangling wide spacer at the new
            // boundary; sever it before truncating/extending.
            if new_len < self.cells.len() {
                sever_right(self, new_len);
            }
            self.cells.resize(new_len, Cell::default());
            self.dirty = true;
        }
    }

    fn sever_left(&mut self, col: usize) {
        sever_left(self, col);
    }

    fn sever_right(&mut self, end: usize) {
        sever_right(self, end);
    }

    fn write_run(&mut self, col: usize, pieces: &[(String, u16)], style: TextAttributes) {
        let len = self.cells.len();
        let mut p = col;
        for (g, w) in pieces {
            if p >= len {
                break;
            }
            let ch = g.chars().next().unwrap_or(' ');
            if *w == 2 {
                self.cells[p] = Cell {
                    c: ch,
                    attrs: style,
                    flags: CellFlags::WIDE_CHAR,
                    tile: None,
                };
                if p + 1 < len {
                    self.cells[p + 1] = Cell::wide_spacer();
                }
                p += 2;
            } else {
                self.cells[p] = Cell {
                    c: ch,
                    attrs: style,
                    flags: CellFlags::empty(),
                    tile: None,
                };
                p += 1;
            }
        }
        self.dirty = true;
    }

    /// Replace cells `[col, col + width(text))` without shifting anything.
    pub fn overwrite(&mut self, col: usize, text: &str, style: TextAttributes) {
        let len = self.cells.len();
        let col = col.min(len);
        let pieces = segment_text(text);
        self.sever_left(col);
        let total_width: usize = pieces.iter().map(|(_, w)| *w as usize).sum();
        let end = (col + total_width).min(len);
        self.sever_right(end);
        self.write_run(col, &pieces, style);
    }

    /// Shift cells `[col, end)` right by `width(text)`, writing `text` into
    /// the freed space. Cells pushed past the row's column count are
    /// clipped and returned to the caller as overflow.
    pub fn insert(&mut self, col: usize, text: &str, style: TextAttributes) -> Vec<Cell> {
        let len = self.cells.len();
        let col = col.min(len);
        self.sever_left(col);

        let pieces = segment_text(text);
        let shift: usize = pieces.iter().map(|(_, w)| *w as usize).sum();
        if shift == 0 {
            return Vec::new();
        }

        let keep = len - col;
        let overflow: Vec<Cell> = if shift >= keep {
            self.cells[col..].to_vec()
        } else {
            self.cells[len - shift..].to_vec()
        };

        let drop = shift.min(keep);
        let new_len = len - drop;
        self.cells.truncate(new_len);
        for _ in 0..drop {
            self.cells.insert(col, Cell::default());
        }
        debug_assert_eq!(self.cells.len(), len);

        self.write_run(col, &pieces, style);
        overflow
    }

    /// Remove `n` cells starting at `col`, shifting the remainder left and
    /// padding the right edge with default cells.
    pub fn delete_chars(&mut self, col: usize, n: usize) {
        let len = self.cells.len();
        let col = col.min(len);
        let n = n.min(len.saturating_sub(col));
        if n == 0 {
            return;
        }
        self.sever_left(col);
        let end = col + n;
        self.sever_right(end);
        self.cells.drain(col..end);
        for _ in 0..n {
            self.cells.push(Cell::default());
        }
        self.dirty = true;
    }

    /// Set `[col, col+n)` to default cells carrying `bg`, without shifting.
    pub fn erase(&mut self, col: usize, n: usize, bg: Color) {
        let len = self.cells.len();
        let col = col.min(len);
        let end = (col + n).min(len);
        if col >= end {
            return;
        }
        self.sever_left(col);
        self.sever_right(end);
        for cell in &mut self.cells[col..end] {
            cell.erase(bg);
        }
        self.dirty = true;
    }

    /// Insert `n` blank cells at `col` shifting the rest right, clipping
    /// (and discarding) anything pushed past the row end.
    pub fn insert_blanks(&mut self, col: usize, n: usize) {
        let len = self.cells.len();
        let col = col.min(len);
        let n = n.min(len - col);
        if n == 0 {
            return;
        }
        self.sever_left(col);
        self.cells.truncate(len - n);
        for _ in 0..n {
            self.cells.insert(col, Cell::default());
        }
        self.dirty = true;
    }

    /// Extract logical text from `[col, col+width)`, honoring wide-cell
    /// column accounting (spacer cells contribute no characters).
    pub fn text(&self, col: usize, width: usize) -> String {
        let len = self.cells.len();
        let col = col.min(len);
        let end = (col + width).min(len);
        self.cells[col..end]
            .iter()
            .filter(|c| !c.is_wide_spacer())
            .map(|c| c.c)
            .collect()
    }

    /// Full logical row text, trimmed of trailing default whitespace is the
    /// caller's choice — this returns every column's character.
    pub fn full_text(&self) -> String {
        self.text(0, self.cells.len())
    }

    /// Coalesce adjacent cells sharing a style into styled runs. Wide cells
    /// and tile-bearing cells are never merged with neighbors, matching the
    /// invariant in spec.md §3/§8 that a run containing a wide or tile cell
    /// is never extended.
    pub fn styled_runs(&self) -> Vec<(String, TextAttributes)> {
        let mut runs = Vec::new();
        let mut text = String::new();
        let mut current: Option<TextAttributes> = None;

        let flush = |runs: &mut Vec<(String, TextAttributes)>, text: &mut String, style: Option<TextAttributes>| {
            if let Some(style) = style {
                if !text.is_empty() {
                    runs.push((std::mem::take(text), style));
                }
            }
        };

        for cell in &self.cells {
            if cell.is_wide_spacer() {
                continue;
            }
            if cell.is_wide() || cell.tile.is_some() {
                flush(&mut runs, &mut text, current.take());
                runs.push((cell.c.to_string(), cell.attrs));
                continue;
            }
            match current {
                Some(style) if style.matches_container(&cell.attrs) => {
                    text.push(cell.c);
                }
                _ => {
                    flush(&mut runs, &mut text, current.take());
                    current = Some(cell.attrs);
                    text.push(cell.c);
                }
            }
        }
        flush(&mut runs, &mut text, current.take());
        runs
    }
}

fn sever_left(row: &mut Row, col: usize) {
    if col > 0 && col < row.cells.len() && row.cells[col].is_wide_spacer() {
        row.cells[col - 1] = Cell::default();
    }
}

fn sever_right(row: &mut Row, end: usize) {
    if end < row.cells.len() && row.cells[end].is_wide_spacer() {
        row.cells[end] = Cell::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> TextAttributes {
        TextAttributes::default()
    }

    #[test]
    fn wide_insert_then_narrow_overwrite_severs_right_half() {
        // empty 6-col row; overwrite "abcdef", then wc insert at col 2, then
        // overwrite "x" at col 2 -> "abx ef" (space replaces severed spacer)
        let mut row = Row::new(6);
        row.overwrite(0, "abcdef", style());
        row.overwrite(2, "\u{30C0}", style()); // wide char (DA with dakuten)
        assert!(row.cells[2].is_wide());
        assert!(row.cells[3].is_wide_spacer());
        row.overwrite(2, "x", style());
        let text: String = row.cells.iter().map(|c| c.c).collect();
        assert_eq!(text, "abx ef");
    }

    #[test]
    fn insert_clips_and_returns_overflow() {
        let mut row = Row::new(5);
        row.overwrite(0, "ABCDE", style());
        let overflow = row.insert(1, "XY", style());
        let text: String = row.cells.iter().map(|c| c.c).collect();
        assert_eq!(text, "AXYBC");
        assert_eq!(overflow.len(), 2);
        assert_eq!(overflow.iter().map(|c| c.c).collect::<String>(), "DE");
    }

    #[test]
    fn delete_chars_shifts_left_and_pads() {
        let mut row = Row::new(5);
        row.overwrite(0, "ABCDE", style());
        row.delete_chars(1, 2);
        let text: String = row.cells.iter().map(|c| c.c).collect();
        assert_eq!(text, "ADE  ");
    }

    #[test]
    fn styled_runs_never_merge_wide_cells() {
        let mut row = Row::new(6);
        row.overwrite(0, "ab", style());
        row.overwrite(2, "\u{30C0}", style());
        row.overwrite(4, "cd", style());
        let runs = row.styled_runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].0, "ab");
        assert_eq!(runs[1].0, "\u{30C0}");
        assert_eq!(runs[2].0, "cd");
    }

    #[test]
    fn styled_runs_never_merge_tile_cells() {
        let mut row = Row::new(6);
        row.overwrite(0, "ab", style());
        row.cells[2] = Cell {
            tile: Some(7),
            ..Cell::default()
        };
        row.overwrite(3, "cd", style());
        let runs = row.styled_runs();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].0, "ab");
        assert_eq!(runs[1].0, " ");
        assert_eq!(runs[2].0, "cd");
    }

    #[test]
    fn erase_severs_wide_cell_boundaries() {
        let mut row = Row::new(6);
        row.overwrite(0, "ab", style());
        row.overwrite(2, "\u{30C0}", style());
        row.erase(3, 3, Color::Default);
        assert!(!row.cells[2].is_wide());
        assert_eq!(row.cells[2].c, ' ');
    }
}
