//! Terminal configuration (spec.md §6 "Configuration options").
//!
//! The core takes a `TerminalOptions` snapshot at construction and
//! afterward accepts per-field deltas via
//! [`Terminal::apply_option`](crate::terminal::Terminal::apply_option),
//! replacing the teacher's file-backed, observer-notified `RainConfig` with
//! the typed-struct-plus-delta design note in spec.md §9 — persistence and
//! change notification are a host concern, not the core's.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerminalOptions {
    /// Scroll the view to the bottom when new output arrives.
    pub scroll_on_output: bool,
    /// Scroll the view to the bottom when any key is pressed.
    pub scroll_on_keystroke: bool,
    /// DECAWM default state.
    pub wraparound: bool,
    /// DECRST/SET `?45` default state.
    pub reverse_wraparound: bool,
    /// Backspace sends `0x08` instead of `0x7F` when set.
    pub backspace_sends_backspace: bool,
    pub alt_sends_escape: bool,
    pub meta_sends_escape: bool,
    /// Whether SGR bold is honored at all.
    pub enable_bold: bool,
    /// Whether bold promotes a dark palette index to its bright counterpart.
    pub enable_bold_as_bright: bool,
    /// If false, DECCOLM (`CSI ? 3 h/l`) is a no-op.
    pub allow_column_width_changes: bool,
    pub scrollback_capacity: usize,
    pub tab_width: u16,
    pub find_result_color: Color,
    pub find_result_selected_color: Color,
    pub find_batch_size: usize,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            scroll_on_output: true,
            scroll_on_keystroke: true,
            wraparound: true,
            reverse_wraparound: false,
            backspace_sends_backspace: false,
            alt_sends_escape: true,
            meta_sends_escape: true,
            enable_bold: true,
            enable_bold_as_bright: true,
            allow_column_width_changes: true,
            scrollback_capacity: 10_000,
            tab_width: 8,
            find_result_color: Color::Indexed(3),
            find_result_selected_color: Color::Indexed(11),
            find_batch_size: 50,
        }
    }
}

/// A single-field change pushed by the host after construction, replacing
/// the teacher's preference-change-observer pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConfigDelta {
    ScrollOnOutput(bool),
    ScrollOnKeystroke(bool),
    Wraparound(bool),
    ReverseWraparound(bool),
    BackspaceSendsBackspace(bool),
    AltSendsEscape(bool),
    MetaSendsEscape(bool),
    EnableBold(bool),
    EnableBoldAsBright(bool),
    AllowColumnWidthChanges(bool),
    ScrollbackCapacity(usize),
    TabWidth(u16),
    FindResultColor(Color),
    FindResultSelectedColor(Color),
    FindBatchSize(usize),
}

impl TerminalOptions {
    /// Apply a single delta in place.
    pub fn apply(&mut self, delta: ConfigDelta) {
        match delta {
            ConfigDelta::ScrollOnOutput(v) => self.scroll_on_output = v,
            ConfigDelta::ScrollOnKeystroke(v) => self.scroll_on_keystroke = v,
            ConfigDelta::Wraparound(v) => self.wraparound = v,
            ConfigDelta::ReverseWraparound(v) => self.reverse_wraparound = v,
            ConfigDelta::BackspaceSendsBackspace(v) => self.backspace_sends_backspace = v,
            ConfigDelta::AltSendsEscape(v) => self.alt_sends_escape = v,
            ConfigDelta::MetaSendsEscape(v) => self.meta_sends_escape = v,
            ConfigDelta::EnableBold(v) => self.enable_bold = v,
            ConfigDelta::EnableBoldAsBright(v) => self.enable_bold_as_bright = v,
            ConfigDelta::AllowColumnWidthChanges(v) => self.allow_column_width_changes = v,
            ConfigDelta::ScrollbackCapacity(v) => self.scrollback_capacity = v,
            ConfigDelta::TabWidth(v) => self.tab_width = v.max(1),
            ConfigDelta::FindResultColor(v) => self.find_result_color = v,
            ConfigDelta::FindResultSelectedColor(v) => self.find_result_selected_color = v,
            ConfigDelta::FindBatchSize(v) => self.find_batch_size = v.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_width_delta_clamps_to_at_least_one() {
        let mut opts = TerminalOptions::default();
        opts.apply(ConfigDelta::TabWidth(0));
        assert_eq!(opts.tab_width, 1);
    }

    #[test]
    fn delta_updates_single_field_only() {
        let mut opts = TerminalOptions::default();
        let before = opts;
        opts.apply(ConfigDelta::Wraparound(false));
        assert!(!opts.wraparound);
        assert_eq!(opts.scroll_on_output, before.scroll_on_output);
    }
}
