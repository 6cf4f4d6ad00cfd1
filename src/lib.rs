//! `rain_core`: an xterm-compatible terminal emulator core.
//!
//! This crate owns the hard engineering of a terminal emulator — the
//! byte-stream parser, the dual (primary/alternate) screen grid, the
//! scrollback ring, attribute resolution, keyboard encoding, and an
//! in-memory find index — and nothing else. Rendering, the PTY/transport,
//! preference persistence, and UI chrome are host concerns; this crate
//! exposes plain data and a handful of traits ([`terminal::ReplySink`],
//! [`terminal::ClipboardAccess`], [`find::RowTextSource`]) for a host to
//! plug into.
//!
//! Module layout mirrors the component table this crate was built from:
//!
//! - [`cell`] — the styled-cell / attribute model (C1).
//! - [`row`] — a single display line's cell buffer (C2).
//! - [`screen`] — a cursor-bearing grid of rows (C3).
//! - [`scrollback`] — the bounded history ring (C4).
//! - [`terminal`] — owns both screens, mode bits, and dispatches parsed
//!   commands (C5).
//! - [`parser`] — the byte-level VT state machine (C6).
//! - [`keyboard`] — key event to byte-sequence encoding (C7).
//! - [`find`] — batched row-text search (C8).
//! - [`config`] — the host-tunable option set.
//! - [`error`] — the error type backing geometric/transport failures.

pub mod cell;
pub mod config;
pub mod error;
pub mod find;
pub mod keyboard;
pub mod parser;
pub mod row;
pub mod screen;
pub mod scrollback;
pub mod terminal;

pub use cell::{CellAttrs, Color, TextAttributes};
pub use config::{ConfigDelta, TerminalOptions};
pub use error::{Result, TerminalError};
pub use find::FindIndex;
pub use keyboard::{KeyAction, KeyBindings, KeyCode, KeyEvent, KeyModifiers};
pub use row::Row;
pub use terminal::{ClipboardAccess, ReplySink, Terminal, TerminalEvent};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::find::RowTextSource;

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
    struct NullClipboard;
    impl ClipboardAccess for NullClipboard {
        fn read(&mut self) -> Option<String> {
            None
        }
        fn write(&mut self, _text: String) {}
    }

    struct TerminalRowSource<'a>(&'a Terminal<CollectingSink, NullClipboard>);
    impl RowTextSource for TerminalRowSource<'_> {
        fn row_count(&self) -> usize {
            self.0.row_count()
        }
        fn row_text(&self, i: usize) -> Option<String> {
            self.0.get_row_text(i)
        }
    }

    /// Exercises the row-provider contract end to end: write bytes through
    /// the public `Terminal::write` entry point, then search the resulting
    /// rows with the find index, matching spec.md §8 scenario 6 but driven
    /// entirely through the crate's public API (no module-internal access).
    fn term() -> Terminal<CollectingSink, NullClipboard> {
        Terminal::new(20, 5, TerminalOptions::default(), CollectingSink::default(), NullClipboard)
    }

    #[test]
    fn find_index_walks_rows_produced_by_the_public_terminal_api() {
        let mut t = term();
        for i in 0..20 {
            let marker = if i % 4 == 0 { "needle" } else { "plain" };
            t.write(format!("row {i} {marker}\r\n").as_bytes()).unwrap();
        }
        assert_eq!(t.row_count(), 21); // 5-row screen + 16 rows evicted into scrollback

        let mut index = FindIndex::new(5);
        {
            let source = TerminalRowSource(&t);
            index.start("needle", &source);
            index.run_to_completion(&source);
        }
        assert_eq!(index.total_matches(), 5);
        let first = index.next().unwrap();
        assert_eq!(first.ordinal, 0);
    }

    #[test]
    fn row_count_grows_by_one_per_line_past_screen_height() {
        let mut t = term();
        assert_eq!(t.row_count(), 5);
        for i in 0..30 {
            t.write(format!("line{i}\r\n").as_bytes()).unwrap();
        }
        // The first 4 linefeeds just walk the cursor down the still-open
        // 5-row screen; every linefeed after that evicts the top row into
        // scrollback, growing the timeline by one row each time.
        assert_eq!(t.row_count(), 5 + (30 - 4));
    }
}
