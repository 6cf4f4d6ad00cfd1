//! Terminal (spec component C5): owns the primary and alternate screens,
//! the shared scrollback, tab stops, scroll region, mode bits, and the
//! reply channel. This is the largest module in the crate, grounded
//! throughout in the teacher's `terminal/state.rs`, restructured per
//! spec.md §9's design note into a flat `Command` decode step
//! ([`crate::parser`]) and a single `apply` function here.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::cell::{
    Color, DefaultColors, HyperlinkId, Palette, TextAttributes, UnderlineStyle,
};
use crate::config::{ConfigDelta, TerminalOptions};
use crate::error::{Result, TerminalError};
use crate::parser::{Command, Parser};
use crate::row::Row;
use crate::screen::Screen;
use crate::scrollback::Scrollback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScreen {
    Primary,
    Alternate,
}

/// Mode bits toggled by SM/RM and DECSET/DECRST (spec.md §4.6's mode
/// table), plus the two escape-sequence-toggled keypad modes spec.md §4.7
/// needs for keyboard encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalModes {
    pub insert_mode: bool,
    pub auto_carriage_return: bool,
    pub application_cursor_keys: bool,
    pub application_keypad: bool,
    pub column_132: bool,
    pub reverse_video: bool,
    pub origin_mode: bool,
    pub wraparound: bool,
    pub cursor_blink: bool,
    pub cursor_visible: bool,
    pub reverse_wraparound: bool,
    pub bracketed_paste: bool,
}

impl TerminalModes {
    fn from_options(options: &TerminalOptions) -> Self {
        Self {
            insert_mode: false,
            auto_carriage_return: false,
            application_cursor_keys: false,
            application_keypad: false,
            column_132: false,
            reverse_video: false,
            origin_mode: false,
            wraparound: options.wraparound,
            cursor_blink: true,
            cursor_visible: true,
            reverse_wraparound: options.reverse_wraparound,
            bracketed_paste: false,
        }
    }
}

/// Host-supplied sink for reply bytes (DA/DSR/CPR responses) and anything
/// else the core needs to hand back to the remote peer.
pub trait ReplySink {
    fn write_reply(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

/// Host-supplied clipboard. Keeps the core free of a GUI clipboard
/// dependency (the teacher uses `arboard`, a UI-adjacent crate) while
/// preserving OSC 52 wire behavior.
pub trait ClipboardAccess {
    fn read(&mut self) -> Option<String>;
    fn write(&mut self, text: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorQueryKind {
    Foreground,
    Background,
    Cursor,
}

/// Events the core surfaces for the host rather than resolving itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    TitleChanged(String),
    Bell,
    CwdChanged(String),
    HyperlinkHover(Option<HyperlinkId>),
    ShellPrompt,
    ShellCommandStart,
    ShellCommandFinished(Option<i32>),
    ColorQueryReply { which: ColorQueryKind, reply: String },
    /// `scroll_on_output`/`scroll_on_keystroke` fired: the scroll port
    /// should jump to the bottom of the virtual timeline.
    ScrollToBottomRequested,
}

/// The part of a DCS sequence currently being accumulated by `put()`.
enum DcsKind {
    XtGetTcap,
    DecRqss,
    Unknown,
}

pub struct Terminal<R: ReplySink, C: ClipboardAccess> {
    primary: Screen,
    alternate: Screen,
    scrollback: Scrollback,
    active: ActiveScreen,
    tab_stops: BTreeSet<u16>,
    scroll_top: u16,
    scroll_bottom: u16,
    modes: TerminalModes,
    options: TerminalOptions,
    palette: Palette,
    defaults: DefaultColors,
    last_print: Option<(String, u16)>,
    hyperlinks: Vec<(HyperlinkId, String)>,
    next_hyperlink_id: HyperlinkId,
    parser: Parser,
    reply_sink: R,
    clipboard: C,
    events: Vec<TerminalEvent>,
    dcs_kind: Option<DcsKind>,
    dcs_buf: Vec<u8>,
    alt_cursor_saved_on_enter: bool,
}

fn default_tab_stops(columns: u16, tab_width: u16) -> BTreeSet<u16> {
    let tab_width = tab_width.max(1);
    (0..columns).step_by(tab_width as usize).collect()
}

impl<R: ReplySink, C: ClipboardAccess> Terminal<R, C> {
    pub fn new(columns: u16, rows: u16, options: TerminalOptions, reply_sink: R, clipboard: C) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let modes = TerminalModes::from_options(&options);
        Self {
            primary: Screen::new(columns, rows),
            alternate: Screen::new(columns, rows),
            scrollback: Scrollback::new(options.scrollback_capacity),
            active: ActiveScreen::Primary,
            tab_stops: default_tab_stops(columns, options.tab_width),
            scroll_top: 0,
            scroll_bottom: rows - 1,
            modes,
            palette: Palette::default(),
            defaults: DefaultColors::default(),
            last_print: None,
            hyperlinks: Vec::new(),
            next_hyperlink_id: 1,
            parser: Parser::new(),
            reply_sink,
            clipboard,
            events: Vec::new(),
            dcs_kind: None,
            dcs_buf: Vec::new(),
            alt_cursor_saved_on_enter: false,
            options,
        }
    }

    pub fn options(&self) -> &TerminalOptions {
        &self.options
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn active_screen_kind(&self) -> ActiveScreen {
        self.active
    }

    pub fn drain_events(&mut self) -> Vec<TerminalEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply_option(&mut self, delta: ConfigDelta) {
        self.options.apply(delta);
        match delta {
            ConfigDelta::Wraparound(v) => self.modes.wraparound = v,
            ConfigDelta::ReverseWraparound(v) => self.modes.reverse_wraparound = v,
            ConfigDelta::ScrollbackCapacity(cap) => self.scrollback.set_capacity(cap),
            ConfigDelta::TabWidth(w) => {
                self.tab_stops = default_tab_stops(self.active_screen().column_count, w);
            }
            _ => {}
        }
    }

    fn active_screen(&self) -> &Screen {
        match self.active {
            ActiveScreen::Primary => &self.primary,
            ActiveScreen::Alternate => &self.alternate,
        }
    }

    fn active_screen_mut(&mut self) -> &mut Screen {
        match self.active {
            ActiveScreen::Primary => &mut self.primary,
            ActiveScreen::Alternate => &mut self.alternate,
        }
    }

    pub fn row_count(&self) -> usize {
        self.scrollback.len() + self.active_screen().row_count()
    }

    /// Look up by absolute index in the virtual timeline: scrollback rows
    /// first, then the live screen.
    pub fn get_row(&self, absolute_index: usize) -> Option<&Row> {
        if absolute_index < self.scrollback.len() {
            self.scrollback.get(self.scrollback.base_index() + absolute_index)
        } else {
            self.active_screen().row(absolute_index - self.scrollback.len())
        }
    }

    pub fn get_row_text(&self, absolute_index: usize) -> Option<String> {
        self.get_row(absolute_index).map(Row::full_text)
    }

    // ---- writing ----------------------------------------------------

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let commands = self.parser.feed(bytes);
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Paste plain text, wrapping it in bracketed-paste markers if the mode
    /// is active. The transport write itself is the host's job; this only
    /// prepares the payload the host should send.
    pub fn paste(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::new();
        if self.modes.bracketed_paste {
            out.extend_from_slice(b"\x1b[200~");
        }
        out.extend_from_slice(text.as_bytes());
        if self.modes.bracketed_paste {
            out.extend_from_slice(b"\x1b[201~");
        }
        out
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Print(text) => self.print(&text),
            Command::Execute(byte) => self.execute(byte),
            Command::Csi {
                params,
                private,
                intermediates,
                action,
            } => self.csi_dispatch(&params, private, &intermediates, action)?,
            Command::Esc { intermediates, byte } => self.esc_dispatch(&intermediates, byte),
            Command::Osc(params) => self.osc_dispatch(&params)?,
            Command::DcsHook {
                params,
                private,
                intermediates,
                action,
            } => self.dcs_hook(&params, private, &intermediates, action),
            Command::DcsPut(byte) => self.dcs_buf.push(byte),
            Command::DcsUnhook => self.dcs_unhook()?,
        }
        Ok(())
    }

    // ---- printing -----------------------------------------------------

    fn dec_line_drawing_char(c: char) -> char {
        match c {
            '`' => '\u{25C6}',
            'a' => '\u{2592}',
            'b' => '\u{2409}',
            'c' => '\u{240C}',
            'd' => '\u{240D}',
            'e' => '\u{240A}',
            'f' => '\u{00B0}',
            'g' => '\u{00B1}',
            'h' => '\u{2424}',
            'i' => '\u{240B}',
            'j' => '\u{2518}',
            'k' => '\u{2510}',
            'l' => '\u{250C}',
            'm' => '\u{2514}',
            'n' => '\u{253C}',
            'o' => '\u{23BA}',
            'p' => '\u{23BB}',
            'q' => '\u{2500}',
            'r' => '\u{23BC}',
            's' => '\u{23BD}',
            't' => '\u{251C}',
            'u' => '\u{2524}',
            'v' => '\u{2534}',
            'w' => '\u{252C}',
            'x' => '\u{2502}',
            'y' => '\u{2264}',
            'z' => '\u{2265}',
            '{' => '\u{03C0}',
            '|' => '\u{2260}',
            '}' => '\u{00A3}',
            '~' => '\u{00B7}',
            other => other,
        }
    }

    fn print(&mut self, text: &str) {
        let line_drawing = self.active_screen().cursor.line_drawing;
        let pieces = crate::row::segment(text);
        for (grapheme, mut width) in pieces {
            let grapheme = if line_drawing && grapheme.len() == 1 {
                let c = grapheme.chars().next().unwrap();
                let mapped = Self::dec_line_drawing_char(c);
                width = 1;
                mapped.to_string()
            } else {
                grapheme
            };

            if self.active_screen().cursor.overflow && self.modes.wraparound {
                self.wrap_line();
            }

            let cols = self.active_screen().column_count;
            let col = self.active_screen().cursor.col;
            if col + width > cols {
                if width == 2 && col + 1 == cols {
                    // Wide glyph doesn't fit in the last column: pad it
                    // with a space and wrap before placing the glyph.
                    self.active_screen_mut().overwrite_string(" ");
                    if self.modes.wraparound {
                        self.wrap_line();
                    } else {
                        self.active_screen_mut().cursor.overflow = true;
                        continue;
                    }
                } else if !self.modes.wraparound {
                    // No wraparound: stay at the last column, overwriting it.
                    self.active_screen_mut().cursor.col = cols.saturating_sub(width);
                }
            }

            self.print_one(&grapheme, width);
            self.last_print = Some((grapheme, width));
        }

        if self.options.scroll_on_output {
            self.events.push(TerminalEvent::ScrollToBottomRequested);
        }
    }

    fn print_one(&mut self, grapheme: &str, width: u16) {
        let insert_mode = self.modes.insert_mode;
        if insert_mode {
            let _overflow = self.active_screen_mut().insert_string(grapheme);
        } else {
            self.active_screen_mut().overwrite_string(grapheme);
        }
        let cols = self.active_screen().column_count;
        let screen = self.active_screen_mut();
        let new_col = screen.cursor.col + width;
        if new_col >= cols {
            screen.cursor.col = cols;
            screen.cursor.overflow = true;
        } else {
            screen.cursor.col = new_col;
            screen.cursor.overflow = false;
        }
    }

    /// CSI `b` (REP): replay the last printed grapheme `n` times.
    fn repeat_last(&mut self, n: usize) {
        if let Some((g, _)) = self.last_print.clone() {
            for _ in 0..n {
                self.print(&g);
            }
        }
    }

    // ---- cursor / line movement ----------------------------------------

    /// Vertical-only movement shared by LF and the DECAWM wrap path: grows
    /// the screen into scrollback when at the last row, scrolls the region
    /// when at its bottom, otherwise steps the cursor down one row.
    fn advance_line(&mut self) {
        let cursor_row = self.active_screen().cursor.row;
        let last_row = self.active_screen().row_count() as u16 - 1;
        if cursor_row == self.scroll_bottom && self.scroll_bottom == last_row {
            self.transfer_or_push_row();
        } else if cursor_row == self.scroll_bottom {
            self.scroll_region_up(1);
        } else if cursor_row < last_row {
            let col = self.active_screen().cursor.col;
            self.active_screen_mut().set_cursor(cursor_row as i64 + 1, col as i64);
        }
    }

    /// Primary-only: push the top row of the scroll region into scrollback
    /// (when it spans the whole screen) and append a blank row at bottom.
    fn transfer_or_push_row(&mut self) {
        if matches!(self.active, ActiveScreen::Primary) && self.scroll_top == 0 {
            if let Some(evicted) = self.primary.shift_row() {
                self.scrollback.push(evicted);
            }
            let cols = self.primary.column_count;
            self.primary.push_row(Row::new(cols));
        } else {
            // Scroll region doesn't reach the top, or we're on the
            // alternate screen: scroll within the region, no scrollback.
            self.scroll_region_up(1);
        }
    }

    fn linefeed(&mut self) {
        self.advance_line();
        if self.modes.auto_carriage_return {
            self.carriage_return();
        }
    }

    fn wrap_line(&mut self) {
        self.advance_line();
        let row = self.active_screen().cursor.row;
        self.active_screen_mut().set_cursor(row as i64, 0);
    }

    fn reverse_index(&mut self) {
        let cursor_row = self.active_screen().cursor.row;
        if cursor_row == self.scroll_top {
            self.scroll_region_down(1);
        } else {
            let col = self.active_screen().cursor.col;
            self.active_screen_mut().set_cursor(cursor_row as i64 - 1, col as i64);
        }
    }

    fn carriage_return(&mut self) {
        let row = self.active_screen().cursor.row;
        self.active_screen_mut().set_cursor(row as i64, 0);
    }

    fn backspace(&mut self) {
        self.active_screen_mut().cursor_left(1);
    }

    fn tab_forward(&mut self, n: usize) {
        for _ in 0..n.max(1) {
            let col = self.active_screen().cursor.col;
            let next = self
                .tab_stops
                .range(col + 1..)
                .next()
                .copied()
                .unwrap_or(self.active_screen().column_count);
            let row = self.active_screen().cursor.row;
            self.active_screen_mut().set_cursor(row as i64, next as i64);
        }
    }

    fn tab_backward(&mut self, n: usize) {
        for _ in 0..n.max(1) {
            let col = self.active_screen().cursor.col;
            let prev = self
                .tab_stops
                .range(..col)
                .next_back()
                .copied()
                .unwrap_or(0);
            let row = self.active_screen().cursor.row;
            self.active_screen_mut().set_cursor(row as i64, prev as i64);
        }
    }

    /// `vt_scroll_up(n)`: remove `n` rows from the top of the scroll
    /// region and insert `n` blank rows at the bottom. Scrolled-off rows
    /// are never pushed to scrollback (by design, spec.md §4.5).
    fn scroll_region_up(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top as usize, self.scroll_bottom as usize);
        let screen = self.active_screen_mut();
        let saved_cursor = screen.cursor;
        screen.cursor.row = top as u16;
        screen.delete_lines(top, bottom, n);
        screen.cursor = saved_cursor;
    }

    fn scroll_region_down(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top as usize, self.scroll_bottom as usize);
        let screen = self.active_screen_mut();
        let saved_cursor = screen.cursor;
        screen.cursor.row = top as u16;
        screen.insert_lines(top, bottom, n);
        screen.cursor = saved_cursor;
    }

    // ---- control dispatch -----------------------------------------------

    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => self.events.push(TerminalEvent::Bell),
            0x08 => self.backspace(),
            0x09 => self.tab_forward(1),
            0x0A | 0x0B | 0x0C => self.linefeed(),
            0x0D => self.carriage_return(),
            0x18 => {} // CAN: parser already aborted the sequence.
            0x1A => self.print_one("?", 1), // SUB: abort, then print '?' at the cursor.
            _ => debug!(byte, "ignored C0/C1 control byte"),
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], byte: u8) {
        match (intermediates, byte) {
            (b"", b'D') => self.linefeed(),
            (b"", b'E') => {
                self.carriage_return();
                self.linefeed();
            }
            (b"", b'H') => {
                let col = self.active_screen().cursor.col;
                self.tab_stops.insert(col);
            }
            (b"", b'M') => self.reverse_index(),
            (b"", b'7') => self.save_cursor_and_modes(),
            (b"", b'8') => self.restore_cursor_and_modes(),
            (b"", b'=') => self.modes.application_keypad = true,
            (b"", b'>') => self.modes.application_keypad = false,
            (b"", b'c') => self.reset(),
            (b"#", b'8') => self.dec_screen_alignment_test(),
            (b"(", b'0') => self.active_screen_mut().cursor.line_drawing = true,
            (b"(", b'B') => self.active_screen_mut().cursor.line_drawing = false,
            _ => debug!(?intermediates, byte, "unhandled ESC sequence"),
        }
    }

    fn dec_screen_alignment_test(&mut self) {
        let cols = self.active_screen().column_count as usize;
        let rows = self.active_screen().row_count();
        let style = TextAttributes::default();
        for r in 0..rows {
            if let Some(row) = self.active_screen_mut().row_mut(r) {
                row.overwrite(0, &"E".repeat(cols), style);
            }
        }
    }

    fn csi_dispatch(
        &mut self,
        params: &[i64],
        private: Option<u8>,
        intermediates: &[u8],
        action: char,
    ) -> Result<()> {
        let p = |i: usize, default: i64| params.get(i).copied().filter(|&v| v != 0).unwrap_or(default);
        let raw = |i: usize, default: i64| params.get(i).copied().unwrap_or(default);

        match (private, intermediates, action) {
            (None, b"", 'A') => self.active_screen_mut().cursor_up(p(0, 1) as u16),
            (None, b"", 'B' | 'e') => self.active_screen_mut().cursor_down(p(0, 1) as u16),
            (None, b"", 'C' | 'a') => self.active_screen_mut().cursor_right(p(0, 1) as u16),
            (None, b"", 'D') => self.active_screen_mut().cursor_left(p(0, 1) as u16),
            (None, b"", 'E') => {
                self.active_screen_mut().cursor_down(p(0, 1) as u16);
                self.carriage_return();
            }
            (None, b"", 'F') => {
                self.active_screen_mut().cursor_up(p(0, 1) as u16);
                self.carriage_return();
            }
            (None, b"", 'G' | '`') => {
                let row = self.active_screen().cursor.row;
                self.active_screen_mut().set_cursor(row as i64, p(0, 1) - 1);
            }
            (None, b"", 'd') => {
                let col = self.active_screen().cursor.col;
                self.active_screen_mut().set_cursor(p(0, 1) - 1, col as i64);
            }
            (None, b"", 'H' | 'f') => self.cursor_position(p(0, 1), p(1, 1)),
            (None, b"", 'I') => self.tab_forward(p(0, 1) as usize),
            (None, b"", 'Z') => self.tab_backward(p(0, 1) as usize),
            (None, b"", 'J') => self.erase_display(raw(0, 0)),
            (None, b"", 'K') => self.erase_line(raw(0, 0)),
            (None, b"", 'L') => {
                let n = p(0, 1) as usize;
                self.scroll_region_bounded_insert(n);
            }
            (None, b"", 'M') => {
                let n = p(0, 1) as usize;
                self.scroll_region_bounded_delete(n);
            }
            (None, b"", 'P') => self.active_screen_mut().delete_chars(p(0, 1) as usize),
            (None, b"", '@') => self.active_screen_mut().insert_blanks(p(0, 1) as usize),
            (None, b"", 'X') => {
                let (row_idx, col, bg) = {
                    let s = self.active_screen();
                    (s.cursor.row as usize, s.cursor.col as usize, s.pen.bg)
                };
                if let Some(row) = self.active_screen_mut().row_mut(row_idx) {
                    row.erase(col, p(0, 1) as usize, bg);
                }
            }
            (None, b"", 'S') => self.scroll_region_up(p(0, 1) as usize),
            (None, b"", 'T') => self.scroll_region_down(p(0, 1) as usize),
            (None, b"", 'b') => self.repeat_last(p(0, 1) as usize),
            (None, b"", 'm') => self.handle_sgr(params),
            (None, b"", 'n') => self.handle_dsr(raw(0, 0))?,
            (None, b"", 'c') => self.reply(b"\x1b[?1;2c")?, // Primary DA
            (Some(b'>'), b"", 'c') => self.reply(b"\x1b[>0;256;0c")?, // Secondary DA
            (Some(b'?'), b"", 'n') => self.handle_dec_dsr(raw(0, 0))?,
            (None, b"", 'r') => self.set_scroll_region(raw(0, 0), raw(1, 0)),
            (Some(b'?'), b"", 'h') => self.set_dec_modes(params, true),
            (Some(b'?'), b"", 'l') => self.set_dec_modes(params, false),
            (None, b"", 'h') => self.set_ansi_modes(params, true),
            (None, b"", 'l') => self.set_ansi_modes(params, false),
            (Some(b'?'), b"$", 'p') => self.report_dec_mode(raw(0, 0))?,
            (None, b"$", 'p') => self.report_ansi_mode(raw(0, 0))?,
            (None, b"!", 'p') => self.soft_reset(),
            (None, b"", 's') => self.save_cursor_and_modes(),
            (None, b"", 'u') => self.restore_cursor_and_modes(),
            _ => debug!(?private, ?intermediates, action, "unhandled CSI sequence"),
        }
        Ok(())
    }

    fn cursor_position(&mut self, row: i64, col: i64) {
        let row = if self.modes.origin_mode {
            self.scroll_top as i64 + row - 1
        } else {
            row - 1
        };
        self.active_screen_mut().set_cursor(row, col - 1);
    }

    fn scroll_region_bounded_insert(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top as usize, self.scroll_bottom as usize);
        self.active_screen_mut().insert_lines(top, bottom, n);
    }

    fn scroll_region_bounded_delete(&mut self, n: usize) {
        let (top, bottom) = (self.scroll_top as usize, self.scroll_bottom as usize);
        self.active_screen_mut().delete_lines(top, bottom, n);
    }

    fn erase_display(&mut self, mode: i64) {
        match mode {
            0 => self.active_screen_mut().erase_below(),
            1 => self.active_screen_mut().erase_above(),
            2 => self.active_screen_mut().erase_all(),
            3 => {
                // xterm compatibility: ED 3 also clears scrollback, per
                // spec.md §4.5 and the resolved Open Question in §9.
                self.active_screen_mut().erase_all();
                self.scrollback.clear();
            }
            _ => debug!(mode, "unknown ED mode"),
        }
    }

    fn erase_line(&mut self, mode: i64) {
        match mode {
            0 => self.active_screen_mut().erase_to_right(),
            1 => self.active_screen_mut().erase_to_left(),
            2 => self.active_screen_mut().clear_cursor_row(),
            _ => debug!(mode, "unknown EL mode"),
        }
    }

    fn set_scroll_region(&mut self, top: i64, bottom: i64) {
        let max_row = self.active_screen().row_count() as i64 - 1;
        let top = (top - 1).clamp(0, max_row) as u16;
        let bottom = if bottom <= 0 { max_row } else { bottom - 1 }.clamp(0, max_row) as u16;
        if top < bottom {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = max_row as u16;
        }
        self.active_screen_mut().set_cursor(0, 0);
    }

    fn handle_sgr(&mut self, params: &[i64]) {
        if params.is_empty() {
            self.active_screen_mut().pen.sgr_reset();
            return;
        }
        let mut i = 0;
        let screen_bold_as_bright = self.options.enable_bold_as_bright;
        let pen = &mut self.active_screen_mut().pen;
        while i < params.len() {
            match params[i] {
                0 => pen.sgr_reset(),
                1 => pen.flags.insert(crate::cell::CellAttrs::BOLD),
                2 => pen.flags.insert(crate::cell::CellAttrs::FAINT),
                3 => pen.flags.insert(crate::cell::CellAttrs::ITALIC),
                4 => pen.underline_style = UnderlineStyle::Single,
                5 | 6 => pen.flags.insert(crate::cell::CellAttrs::BLINK),
                7 => pen.flags.insert(crate::cell::CellAttrs::INVERSE),
                8 => pen.flags.insert(crate::cell::CellAttrs::INVISIBLE),
                9 => pen.flags.insert(crate::cell::CellAttrs::STRIKETHROUGH),
                21 => pen.underline_style = UnderlineStyle::Double,
                22 => {
                    pen.flags.remove(crate::cell::CellAttrs::BOLD);
                    pen.flags.remove(crate::cell::CellAttrs::FAINT);
                }
                23 => pen.flags.remove(crate::cell::CellAttrs::ITALIC),
                24 => pen.underline_style = UnderlineStyle::None,
                25 => pen.flags.remove(crate::cell::CellAttrs::BLINK),
                27 => pen.flags.remove(crate::cell::CellAttrs::INVERSE),
                28 => pen.flags.remove(crate::cell::CellAttrs::INVISIBLE),
                29 => pen.flags.remove(crate::cell::CellAttrs::STRIKETHROUGH),
                30..=37 => pen.fg = Color::Indexed((params[i] - 30) as u8),
                38 => {
                    let (color, consumed) = Self::parse_extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        pen.fg = color;
                    }
                    i += consumed;
                }
                39 => pen.fg = Color::Default,
                40..=47 => pen.bg = Color::Indexed((params[i] - 40) as u8),
                48 => {
                    let (color, consumed) = Self::parse_extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        pen.bg = color;
                    }
                    i += consumed;
                }
                49 => pen.bg = Color::Default,
                58 => {
                    let (color, consumed) = Self::parse_extended_color(&params[i + 1..]);
                    if let Some(color) = color {
                        pen.underline_color = color;
                    }
                    i += consumed;
                }
                59 => pen.underline_color = Color::Default,
                90..=97 => pen.fg = Color::Indexed((params[i] - 90) as u8 + 8),
                100..=107 => pen.bg = Color::Indexed((params[i] - 100) as u8 + 8),
                other => debug!(param = other, "unhandled SGR parameter"),
            }
            i += 1;
        }
        let _ = screen_bold_as_bright;
    }

    /// Parse a `5;index` or `2;r;g;b` extended-color tail following SGR
    /// 38/48/58. Returns the color (if recognized) and how many extra
    /// params were consumed beyond the leading 38/48/58 itself.
    fn parse_extended_color(rest: &[i64]) -> (Option<Color>, usize) {
        match rest.first() {
            Some(5) if rest.len() >= 2 => (Some(Color::Indexed(rest[1] as u8)), 2),
            Some(2) if rest.len() >= 4 => {
                (Some(Color::Rgb(rest[1] as u8, rest[2] as u8, rest[3] as u8)), 4)
            }
            _ => (None, rest.len()),
        }
    }

    fn handle_dsr(&mut self, code: i64) -> Result<()> {
        match code {
            5 => self.reply(b"\x1b[0n")?,
            6 => {
                let (row, col) = {
                    let c = self.active_screen().cursor;
                    (c.row + 1, c.col + 1)
                };
                self.reply(format!("\x1b[{row};{col}R").as_bytes())?;
            }
            _ => debug!(code, "unhandled DSR"),
        }
        Ok(())
    }

    fn handle_dec_dsr(&mut self, code: i64) -> Result<()> {
        match code {
            6 => {
                let (row, col) = {
                    let c = self.active_screen().cursor;
                    (c.row + 1, c.col + 1)
                };
                self.reply(format!("\x1b[?{row};{col}R").as_bytes())?;
            }
            15 => self.reply(b"\x1b[?11n")?,
            25 => self.reply(b"\x1b[?21n")?,
            26 => self.reply(b"\x1b[?12;1;0;0n")?,
            53 => self.reply(b"\x1b[?50n")?,
            _ => debug!(code, "unhandled DEC DSR"),
        }
        Ok(())
    }

    fn report_dec_mode(&mut self, code: i64) -> Result<()> {
        let state = self.dec_mode_state(code);
        self.reply(format!("\x1b[?{code};{state}$y").as_bytes())
    }

    fn report_ansi_mode(&mut self, code: i64) -> Result<()> {
        let state = self.ansi_mode_state(code);
        self.reply(format!("\x1b[{code};{state}$y").as_bytes())
    }

    fn dec_mode_state(&self, code: i64) -> u8 {
        let set = match code {
            1 => self.modes.application_cursor_keys,
            3 => self.modes.column_132,
            5 => self.modes.reverse_video,
            6 => self.modes.origin_mode,
            7 => self.modes.wraparound,
            12 => self.modes.cursor_blink,
            25 => self.modes.cursor_visible,
            45 => self.modes.reverse_wraparound,
            47 | 1047 | 1049 => matches!(self.active, ActiveScreen::Alternate),
            1048 => self.active_screen().has_saved_options(),
            2004 => self.modes.bracketed_paste,
            _ => return 0,
        };
        if set {
            1
        } else {
            2
        }
    }

    fn ansi_mode_state(&self, code: i64) -> u8 {
        let set = match code {
            4 => self.modes.insert_mode,
            20 => self.modes.auto_carriage_return,
            _ => return 0,
        };
        if set {
            1
        } else {
            2
        }
    }

    fn set_ansi_modes(&mut self, params: &[i64], enable: bool) {
        for &code in params {
            match code {
                4 => self.modes.insert_mode = enable,
                20 => self.modes.auto_carriage_return = enable,
                _ => debug!(code, enable, "unhandled ANSI mode"),
            }
        }
    }

    fn set_dec_modes(&mut self, params: &[i64], enable: bool) {
        for &code in params {
            match code {
                1 => self.modes.application_cursor_keys = enable,
                3 => self.set_decolm(enable),
                5 => self.modes.reverse_video = enable,
                6 => {
                    self.modes.origin_mode = enable;
                    self.active_screen_mut().set_cursor(0, 0);
                }
                7 => self.modes.wraparound = enable,
                12 => self.modes.cursor_blink = enable,
                25 => self.modes.cursor_visible = enable,
                45 => self.modes.reverse_wraparound = enable,
                47 => self.switch_alt_screen(enable, false, false),
                1047 => self.switch_alt_screen(enable, true, false),
                1048 => {
                    if enable {
                        self.save_cursor_and_modes();
                    } else {
                        self.restore_cursor_and_modes();
                    }
                }
                1049 => self.switch_alt_screen(enable, true, true),
                2004 => self.modes.bracketed_paste = enable,
                _ => debug!(code, enable, "unhandled DEC private mode"),
            }
        }
    }

    fn set_decolm(&mut self, wide: bool) {
        if !self.options.allow_column_width_changes {
            return;
        }
        self.modes.column_132 = wide;
        let cols = if wide { 132 } else { 80 };
        self.resize(cols, self.active_screen().row_count() as u16)
            .ok();
        self.active_screen_mut().erase_all();
        let max_row = self.active_screen().row_count() as u16 - 1;
        self.scroll_top = 0;
        self.scroll_bottom = max_row;
        self.active_screen_mut().set_cursor(0, 0);
    }

    /// Switch between primary and alternate screen. `clear_on_enter`
    /// matches DECSET 1047/1049; `save_cursor` matches 1049's extra
    /// cursor-save/restore half (the "1048" component of 1049).
    fn switch_alt_screen(&mut self, enable: bool, clear_on_enter: bool, save_cursor: bool) {
        match (enable, self.active) {
            (true, ActiveScreen::Primary) => {
                if save_cursor {
                    let (origin_mode, wraparound) = (self.modes.origin_mode, self.modes.wraparound);
                    self.primary.save_options(origin_mode, wraparound);
                    self.alt_cursor_saved_on_enter = true;
                }
                self.active = ActiveScreen::Alternate;
                if clear_on_enter {
                    self.alternate.erase_all();
                    self.alternate.set_cursor(0, 0);
                }
            }
            (false, ActiveScreen::Alternate) => {
                self.active = ActiveScreen::Primary;
                if save_cursor && self.alt_cursor_saved_on_enter {
                    if let Some((origin_mode, wraparound)) = self.primary.restore_options() {
                        self.modes.origin_mode = origin_mode;
                        self.modes.wraparound = wraparound;
                    }
                    self.alt_cursor_saved_on_enter = false;
                }
            }
            _ => {}
        }
    }

    /// DECSC (`ESC 7`) / `CSI s` / DECSET 1048 enable: save cursor, pen,
    /// and the origin-mode/wraparound bits onto the active screen's single
    /// save slot (spec.md §4.5; `origin_mode`/`wraparound` live on
    /// `Terminal::modes`, out of `Screen`'s reach, so they're threaded
    /// through here rather than saved by `Screen` itself).
    fn save_cursor_and_modes(&mut self) {
        let (origin_mode, wraparound) = (self.modes.origin_mode, self.modes.wraparound);
        self.active_screen_mut().save_options(origin_mode, wraparound);
    }

    /// DECRC (`ESC 8`) / `CSI u` / DECSET 1048 disable: restore cursor,
    /// pen, and origin-mode/wraparound together, per the testable property
    /// in spec.md §8 ("after DECSC then DECRC ... cursor, active style,
    /// origin-mode, wraparound are bitwise equal").
    fn restore_cursor_and_modes(&mut self) {
        if let Some((origin_mode, wraparound)) = self.active_screen_mut().restore_options() {
            self.modes.origin_mode = origin_mode;
            self.modes.wraparound = wraparound;
        }
    }

    /// DECSTR / `CSI ! p`: a lighter reset than `ESC c` — resets modes,
    /// pen, scroll region, and tab stops without clearing the grid or
    /// scrollback. The teacher's `ESC c` handler conflates this with a
    /// full reset; spec.md §4.5 requires them distinct.
    pub fn soft_reset(&mut self) {
        self.modes = TerminalModes::from_options(&self.options);
        let cols = self.active_screen().column_count;
        self.tab_stops = default_tab_stops(cols, self.options.tab_width);
        let rows = self.active_screen().row_count() as u16;
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        let screen = self.active_screen_mut();
        screen.pen = TextAttributes::default();
        screen.cursor = Default::default();
    }

    /// `ESC c` / RIS: full hard reset, clearing both screens and
    /// scrollback.
    pub fn reset(&mut self) {
        let (cols, rows) = {
            let s = self.active_screen();
            (s.column_count, s.row_count() as u16)
        };
        self.primary = Screen::new(cols, rows);
        self.alternate = Screen::new(cols, rows);
        self.scrollback.clear();
        self.active = ActiveScreen::Primary;
        self.tab_stops = default_tab_stops(cols, self.options.tab_width);
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.modes = TerminalModes::from_options(&self.options);
        self.last_print = None;
        self.hyperlinks.clear();
        self.alt_cursor_saved_on_enter = false;
    }

    /// Resize both screens. Grows by drawing rows back from scrollback
    /// when possible (primary only); shrinks by transferring the excess
    /// top rows into scrollback. Rejects degenerate geometry per
    /// spec.md §4.9.
    pub fn resize(&mut self, columns: u16, rows: u16) -> Result<()> {
        if columns == 0 || rows == 0 {
            warn!(columns, rows, "rejected resize to degenerate geometry");
            return Err(TerminalError::ResizeRejected { columns, rows });
        }

        self.primary.set_column_count(columns);
        self.alternate.set_column_count(columns);
        self.resize_primary_rows(rows);
        self.alternate.set_row_count(rows);

        self.tab_stops = default_tab_stops(columns, self.options.tab_width);
        let max_row = rows - 1;
        self.scroll_top = 0;
        self.scroll_bottom = max_row;
        Ok(())
    }

    fn resize_primary_rows(&mut self, rows: u16) {
        let rows = rows as usize;
        let current = self.primary.row_count();
        match rows.cmp(&current) {
            std::cmp::Ordering::Greater => {
                let mut needed = rows - current;
                while needed > 0 {
                    if let Some(row) = self.scrollback.pop_back() {
                        self.primary.unshift_row(row);
                    } else {
                        let cols = self.primary.column_count;
                        self.primary.push_row(Row::new(cols));
                    }
                    needed -= 1;
                }
            }
            std::cmp::Ordering::Less => {
                let mut excess = current - rows;
                while excess > 0 && self.primary.row_count() > rows {
                    // Prefer trimming a blank row from the bottom first.
                    let bottom_blank = self
                        .primary
                        .row(self.primary.row_count() - 1)
                        .map(|r| r.full_text().trim_end().is_empty())
                        .unwrap_or(true);
                    if bottom_blank && self.primary.row_count() > rows {
                        self.primary.pop_row();
                    } else if let Some(row) = self.primary.shift_row() {
                        self.scrollback.push(row);
                    }
                    excess -= 1;
                }
            }
            std::cmp::Ordering::Equal => {}
        }
    }

    /// Writes a terminal reply (DSR/DA/OSC query answers, DCS responses)
    /// back through the host-supplied sink. Unlike every other dispatch
    /// path, a failure here is surfaced to the caller of `write` rather
    /// than logged and dropped (spec.md §7's one non-swallowed error kind).
    fn reply(&mut self, bytes: &[u8]) -> Result<()> {
        self.reply_sink.write_reply(bytes)?;
        Ok(())
    }

    // ---- OSC --------------------------------------------------------

    fn osc_dispatch(&mut self, params: &[Vec<u8>]) -> Result<()> {
        let Some(ps) = params.first().and_then(|p| std::str::from_utf8(p).ok()) else {
            return Ok(());
        };
        let pt = |i: usize| params.get(i).map(|p| p.as_slice()).unwrap_or(b"");
        match ps {
            "0" | "2" => {
                if let Ok(title) = std::str::from_utf8(pt(1)) {
                    self.events.push(TerminalEvent::TitleChanged(title.to_string()));
                }
            }
            "7" => {
                if let Ok(cwd) = std::str::from_utf8(pt(1)) {
                    self.events.push(TerminalEvent::CwdChanged(cwd.to_string()));
                }
            }
            "8" => self.handle_osc8(pt(1), pt(2)),
            "4" => self.handle_osc4(&params[1..]),
            "10" => self.handle_osc_color_query(ColorQueryKind::Foreground, pt(1))?,
            "11" => self.handle_osc_color_query(ColorQueryKind::Background, pt(1))?,
            "12" => self.handle_osc_color_query(ColorQueryKind::Cursor, pt(1))?,
            "52" => self.handle_osc52(pt(1), pt(2))?,
            "133" => self.handle_osc133(pt(1)),
            "1337" => {} // iTerm2 image protocol: recognized, not rendered (non-goal).
            _ => debug!(ps, "unhandled OSC"),
        }
        Ok(())
    }

    fn handle_osc8(&mut self, _params: &[u8], uri: &[u8]) {
        if uri.is_empty() {
            self.active_screen_mut().pen.hyperlink = None;
            return;
        }
        let Ok(uri) = std::str::from_utf8(uri) else { return };
        let id = self.next_hyperlink_id;
        self.next_hyperlink_id += 1;
        self.hyperlinks.push((id, uri.to_string()));
        self.active_screen_mut().pen.hyperlink = Some(id);
    }

    fn handle_osc4(&mut self, pairs: &[Vec<u8>]) {
        // `Ps ; c ; spec ; c ; spec ...` pairs of palette index/color spec.
        let mut i = 0;
        while i + 1 < pairs.len() {
            if let (Ok(_index), Ok(_spec)) = (
                std::str::from_utf8(&pairs[i]).unwrap_or("").parse::<u8>(),
                std::str::from_utf8(&pairs[i + 1]),
            ) {
                // Palette writes are a host/theme concern beyond the
                // in-memory Palette the core resolves indices against;
                // recognized and drained so it doesn't desync the parser.
            }
            i += 2;
        }
    }

    fn handle_osc_color_query(&mut self, which: ColorQueryKind, param: &[u8]) -> Result<()> {
        if param != b"?" {
            return Ok(());
        }
        let (r, g, b) = match which {
            ColorQueryKind::Foreground => self.defaults.foreground,
            ColorQueryKind::Background => self.defaults.background,
            ColorQueryKind::Cursor => self.defaults.foreground,
        };
        let reply = format!(
            "\x1b]{};rgb:{:02x}{:02x}/{:02x}{:02x}/{:02x}{:02x}\x07",
            match which {
                ColorQueryKind::Foreground => 10,
                ColorQueryKind::Background => 11,
                ColorQueryKind::Cursor => 12,
            },
            r,
            r,
            g,
            g,
            b,
            b
        );
        self.reply(reply.as_bytes())?;
        self.events.push(TerminalEvent::ColorQueryReply { which, reply });
        Ok(())
    }

    fn handle_osc52(&mut self, selection: &[u8], payload: &[u8]) -> Result<()> {
        use base64::Engine;
        let _ = selection;
        if payload == b"?" {
            if let Some(text) = self.clipboard.read() {
                let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
                self.reply(format!("\x1b]52;c;{encoded}\x07").as_bytes())?;
            }
            return Ok(());
        }
        if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(payload) {
            if let Ok(text) = String::from_utf8(decoded) {
                self.clipboard.write(text);
            }
        }
        Ok(())
    }

    fn handle_osc133(&mut self, kind: &[u8]) {
        match kind {
            b"A" => self.events.push(TerminalEvent::ShellPrompt),
            b"B" => {}
            b"C" => self.events.push(TerminalEvent::ShellCommandStart),
            b"D" => {
                let code = None; // exit-code tracking is a host feature.
                self.events.push(TerminalEvent::ShellCommandFinished(code));
            }
            _ => debug!(?kind, "unhandled OSC 133 marker"),
        }
    }

    // ---- DCS ----------------------------------------------------------

    fn dcs_hook(&mut self, _params: &[i64], private: Option<u8>, intermediates: &[u8], action: char) {
        self.dcs_buf.clear();
        self.dcs_kind = Some(match (private, intermediates, action) {
            (None, b"", 'q') => DcsKind::XtGetTcap,
            (None, b"$", 'q') => DcsKind::DecRqss,
            _ => DcsKind::Unknown,
        });
    }

    fn dcs_unhook(&mut self) -> Result<()> {
        let result = match self.dcs_kind.take() {
            Some(DcsKind::XtGetTcap) => self.handle_xtgettcap(),
            Some(DcsKind::DecRqss) => self.handle_decrqss(),
            Some(DcsKind::Unknown) | None => Ok(()),
        };
        self.dcs_buf.clear();
        result
    }

    fn handle_xtgettcap(&mut self) -> Result<()> {
        let hex = self.dcs_buf.clone();
        let Ok(name) = decode_hex_ascii(&hex) else {
            return self.reply(b"\x1bP0+r\x1b\\");
        };
        if let Some(value) = tcap_capability_value(&name) {
            let encoded_name = encode_hex_ascii(name.as_bytes());
            let encoded_value = encode_hex_ascii(value.as_bytes());
            self.reply(format!("\x1bP1+r{encoded_name}={encoded_value}\x1b\\").as_bytes())
        } else {
            self.reply(b"\x1bP0+r\x1b\\")
        }
    }

    fn handle_decrqss(&mut self) -> Result<()> {
        let query = String::from_utf8_lossy(&self.dcs_buf).to_string();
        let reply = match query.as_str() {
            "m" => "0$r0m".to_string(),
            "r" => format!("1$r{};{}r", self.scroll_top + 1, self.scroll_bottom + 1),
            _ => "0$r".to_string(),
        };
        self.reply(format!("\x1bP{reply}\x1b\\").as_bytes())
    }
}

fn decode_hex_ascii(bytes: &[u8]) -> std::result::Result<String, ()> {
    if bytes.len() % 2 != 0 {
        return Err(());
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16).ok_or(())?;
        let lo = (pair[1] as char).to_digit(16).ok_or(())?;
        out.push(((hi << 4) | lo) as u8);
    }
    String::from_utf8(out).map_err(|_| ())
}

fn encode_hex_ascii(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").ok();
    }
    out
}

fn tcap_capability_value(name: &str) -> Option<&'static str> {
    match name {
        "Co" | "colors" => Some("256"),
        "TN" | "name" => Some("xterm-256color"),
        "RGB" => Some(""),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CollectingSink {
        replies: Vec<Vec<u8>>,
    }
    impl ReplySink for CollectingSink {
        fn write_reply(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.replies.push(bytes.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullClipboard {
        stored: Option<String>,
    }
    impl ClipboardAccess for NullClipboard {
        fn read(&mut self) -> Option<String> {
            self.stored.clone()
        }
        fn write(&mut self, text: String) {
            self.stored = Some(text);
        }
    }

    fn term(cols: u16, rows: u16) -> Terminal<CollectingSink, NullClipboard> {
        Terminal::new(cols, rows, TerminalOptions::default(), CollectingSink::default(), NullClipboard::default())
    }

    #[test]
    fn basic_print_and_wrap() {
        let mut t = term(80, 24);
        t.write(&[b'A'; 81]).unwrap();
        assert_eq!(t.active_screen().row(0).unwrap().full_text(), "A".repeat(80));
        assert_eq!(t.active_screen().row(1).unwrap().full_text()[..1], *"A");
        assert_eq!(t.active_screen().cursor.row, 1);
        assert_eq!(t.active_screen().cursor.col, 1);
        assert!(!t.active_screen().cursor.overflow);
    }

    #[test]
    fn wide_character_insert_then_narrow_overwrite() {
        let mut t = term(80, 24);
        t.write(b"abcdef").unwrap();
        t.write(b"\x1b[1;3H").unwrap();
        t.write("\u{30C0}".as_bytes()).unwrap();
        t.write(b"\x1b[1;3H").unwrap();
        t.write(b"x").unwrap();
        assert_eq!(t.active_screen().row(0).unwrap().text(0, 6), "abx ef");
    }

    #[test]
    fn csi_cup_then_cpr_reply() {
        let mut t = term(80, 24);
        t.write(b"\x1b[5;10H\x1b[6n").unwrap();
        assert_eq!(t.active_screen().cursor.row, 4);
        assert_eq!(t.active_screen().cursor.col, 9);
        assert_eq!(t.reply_sink.replies, vec![b"\x1b[5;10R".to_vec()]);
    }

    #[test]
    fn scrollback_transfer_on_overflow() {
        // 5 rows fill with line1..line5; each further line scrolls the
        // screen (evicting the current top row) before printing itself
        // on the freed bottom row, so line5..line10 each trigger one more
        // eviction than a naive "screen minus capacity" count suggests.
        let mut t = term(5, 5);
        for i in 1..=10 {
            t.write(format!("line{i}\r\n").as_bytes()).unwrap();
        }
        assert_eq!(t.scrollback.len(), 6);
        assert_eq!(t.scrollback.get(0).unwrap().full_text().trim_end(), "line1");
        assert_eq!(t.active_screen().row(0).unwrap().full_text().trim_end(), "line7");
        assert_eq!(t.active_screen().cursor.row, 4);
    }

    #[test]
    fn alternate_screen_swap_preserves_scrollback() {
        let mut t = term(5, 5);
        for i in 1..=10 {
            t.write(format!("line{i}\r\n").as_bytes()).unwrap();
        }
        let scrollback_len_before = t.scrollback.len();
        let primary_snapshot = t.primary.row(0).unwrap().full_text();
        t.write(b"\x1b[?1049h").unwrap();
        t.write(b"ALT").unwrap();
        t.write(b"\x1b[?1049l").unwrap();
        assert_eq!(t.scrollback.len(), scrollback_len_before);
        assert_eq!(t.primary.row(0).unwrap().full_text(), primary_snapshot);
        assert_eq!(t.active_screen_kind(), ActiveScreen::Primary);
    }

    #[test]
    fn soft_reset_keeps_grid_but_clears_pen_and_modes() {
        let mut t = term(80, 24);
        t.write(b"hello\x1b[1m\x1b[?1h").unwrap();
        t.write(b"\x1b[!p").unwrap();
        assert!(!t.modes.application_cursor_keys);
        assert!(t.active_screen().pen.is_default());
        assert_eq!(t.active_screen().row(0).unwrap().text(0, 5), "hello");
    }

    #[test]
    fn hard_reset_clears_grid_and_scrollback() {
        let mut t = term(5, 5);
        for i in 1..=10 {
            t.write(format!("line{i}\r\n").as_bytes()).unwrap();
        }
        t.write(b"\x1bc").unwrap();
        assert_eq!(t.scrollback.len(), 0);
        assert_eq!(t.active_screen().row(0).unwrap().full_text().trim_end(), "");
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        let mut t = term(80, 24);
        assert!(t.resize(0, 24).is_err());
    }

    #[test]
    fn repeat_last_replays_printed_grapheme() {
        let mut t = term(80, 24);
        t.write(b"A\x1b[3b").unwrap();
        assert_eq!(t.active_screen().row(0).unwrap().text(0, 4), "AAAA");
    }
}
