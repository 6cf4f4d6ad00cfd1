//! VT parser (spec component C6).
//!
//! Wraps the `vte` crate's byte-level state machine (the same dependency
//! the teacher uses in `terminal/state.rs`) but, per the design note in
//! spec.md §9, does not implement mutation directly in the `vte::Perform`
//! callbacks. Instead [`Performer`] decodes bytes into a flat [`Command`]
//! sum type; [`crate::terminal::Terminal::write`] then applies each command
//! through a single `apply(&mut self, Command)` function. This keeps the
//! parser free of any back-reference to the terminal it feeds.
//!
//! UTF-8 decoding (including the `U+FFFD` substitution and partial-sequence
//! buffering spec.md §4.6 describes) is handled internally by `vte`'s
//! `Parser`, which keeps that state across calls to [`Parser::feed`] the
//! same way the underlying state machine keeps ESC/CSI/OSC/DCS state.

use vte::{Params, Perform};

/// One decoded unit of input, ready to be applied to a `Terminal`.
/// Printable text is grouped into a single `Print` command per
/// print-run (spec.md's "grapheme segmentation... before being handed to
/// the printer" happens in `Terminal::print`, not here).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Print(String),
    /// A bare C0/C1 control byte (BEL, BS, HT, LF, CR, ...).
    Execute(u8),
    Csi {
        params: Vec<i64>,
        private: Option<u8>,
        intermediates: Vec<u8>,
        action: char,
    },
    Esc {
        intermediates: Vec<u8>,
        byte: u8,
    },
    /// `Ps ; Pt` OSC, each `;`-separated field kept as raw bytes since OSC
    /// payloads (titles, hyperlink URIs, base64 clipboard data) are not
    /// always valid UTF-8 ASCII-decimal.
    Osc(Vec<Vec<u8>>),
    DcsHook {
        params: Vec<i64>,
        private: Option<u8>,
        intermediates: Vec<u8>,
        action: char,
    },
    DcsPut(u8),
    DcsUnhook,
}

/// A private-mode marker byte (`?`, `<`, `=`, `>`) is reported by `vte` as
/// the first entry of the intermediates buffer. Split it off.
fn split_marker(intermediates: &[u8]) -> (Option<u8>, Vec<u8>) {
    match intermediates.first() {
        Some(&b @ (b'?' | b'<' | b'=' | b'>')) => (Some(b), intermediates[1..].to_vec()),
        _ => (None, intermediates.to_vec()),
    }
}

fn flatten_params(params: &Params) -> Vec<i64> {
    params
        .iter()
        .flat_map(|group| group.iter().copied())
        .map(|v| v as i64)
        .collect()
}

#[derive(Default)]
pub struct Performer {
    commands: Vec<Command>,
    text_buf: String,
}

impl Performer {
    fn flush_text(&mut self) {
        if !self.text_buf.is_empty() {
            self.commands.push(Command::Print(std::mem::take(&mut self.text_buf)));
        }
    }
}

impl Perform for Performer {
    fn print(&mut self, c: char) {
        self.text_buf.push(c);
    }

    fn execute(&mut self, byte: u8) {
        self.flush_text();
        self.commands.push(Command::Execute(byte));
    }

    fn hook(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        self.flush_text();
        let (private, intermediates) = split_marker(intermediates);
        self.commands.push(Command::DcsHook {
            params: flatten_params(params),
            private,
            intermediates,
            action,
        });
    }

    fn put(&mut self, byte: u8) {
        self.commands.push(Command::DcsPut(byte));
    }

    fn unhook(&mut self) {
        self.commands.push(Command::DcsUnhook);
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        self.flush_text();
        self.commands
            .push(Command::Osc(params.iter().map(|p| p.to_vec()).collect()));
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        self.flush_text();
        let (private, intermediates) = split_marker(intermediates);
        self.commands.push(Command::Csi {
            params: flatten_params(params),
            private,
            intermediates,
            action,
        });
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        self.flush_text();
        self.commands.push(Command::Esc {
            intermediates: intermediates.to_vec(),
            byte,
        });
    }
}

/// Owns the `vte::Parser` state machine across calls to [`Parser::feed`],
/// so a partial escape sequence split across two `write()` calls resumes
/// correctly (spec.md §8's "parsing is idempotent over byte splits").
pub struct Parser {
    inner: vte::Parser,
    performer: Performer,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            inner: vte::Parser::new(),
            performer: Performer::default(),
        }
    }

    /// Feed a chunk of bytes and drain the commands it produced.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Command> {
        for &byte in bytes {
            self.inner.advance(&mut self.performer, byte);
        }
        self.performer.flush_text();
        std::mem::take(&mut self.performer.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_single_print_command() {
        let mut p = Parser::new();
        let cmds = p.feed(b"hello");
        assert_eq!(cmds, vec![Command::Print("hello".to_string())]);
    }

    #[test]
    fn csi_splits_private_marker_from_intermediates() {
        let mut p = Parser::new();
        let cmds = p.feed(b"\x1b[?25h");
        assert_eq!(
            cmds,
            vec![Command::Csi {
                params: vec![25],
                private: Some(b'?'),
                intermediates: vec![],
                action: 'h',
            }]
        );
    }

    #[test]
    fn split_sequence_across_two_feeds_still_dispatches() {
        let mut p = Parser::new();
        let mut cmds = p.feed(b"\x1b[5");
        cmds.extend(p.feed(b";10H"));
        assert_eq!(
            cmds,
            vec![Command::Csi {
                params: vec![5, 10],
                private: None,
                intermediates: vec![],
                action: 'H',
            }]
        );
    }

    #[test]
    fn invalid_utf8_becomes_replacement_character() {
        let mut p = Parser::new();
        let cmds = p.feed(&[0xFF]);
        assert_eq!(cmds, vec![Command::Print("\u{FFFD}".to_string())]);
    }
}
