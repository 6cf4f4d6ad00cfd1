//! Cell / attribute model (spec component C1).
//!
//! A [`Color`] is what the spec calls a "color source": default, a palette
//! index, or direct RGB. [`TextAttributes`] is the pen the cursor paints
//! with; [`Cell`] is a single grid position carrying a character (or the
//! trailing half of a wide glyph) plus the attributes it was painted with.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A color source: unresolved until [`TextAttributes::resolve`] is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Default
    }
}

/// Serializable color for hosts that ship cell data over IPC.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SerializableColor {
    Default,
    Indexed { index: u8 },
    Rgb { r: u8, g: u8, b: u8 },
}

#[cfg(feature = "serde")]
impl From<Color> for SerializableColor {
    fn from(c: Color) -> Self {
        match c {
            Color::Default => SerializableColor::Default,
            Color::Indexed(i) => SerializableColor::Indexed { index: i },
            Color::Rgb(r, g, b) => SerializableColor::Rgb { r, g, b },
        }
    }
}

/// Concrete RGB triple produced by attribute resolution.
pub type Rgb = (u8, u8, u8);

/// Convert a 256-color palette index to RGB.
/// 0..=15 are the standard/bright ANSI colors, 16..=231 a 6x6x6 cube,
/// 232..=255 a grayscale ramp.
pub fn indexed_to_rgb(index: u8) -> Rgb {
    const ANSI16: [Rgb; 16] = [
        (0x00, 0x00, 0x00),
        (0xcd, 0x00, 0x00),
        (0x00, 0xcd, 0x00),
        (0xcd, 0xcd, 0x00),
        (0x00, 0x00, 0xee),
        (0xcd, 0x00, 0xcd),
        (0x00, 0xcd, 0xcd),
        (0xe5, 0xe5, 0xe5),
        (0x7f, 0x7f, 0x7f),
        (0xff, 0x00, 0x00),
        (0x00, 0xff, 0x00),
        (0xff, 0xff, 0x00),
        (0x5c, 0x5c, 0xff),
        (0xff, 0x00, 0xff),
        (0x00, 0xff, 0xff),
        (0xff, 0xff, 0xff),
    ];
    match index {
        0..=15 => ANSI16[index as usize],
        16..=231 => {
            let idx = index - 16;
            let r = idx / 36;
            let g = (idx % 36) / 6;
            let b = idx % 6;
            let to_val = |v: u8| if v == 0 { 0 } else { 55 + 40 * v };
            (to_val(r), to_val(g), to_val(b))
        }
        232..=255 => {
            let v = 8 + 10 * (index - 232);
            (v, v, v)
        }
    }
}

/// The palette a host supplies for resolving indexed colors. Entries 0..=15
/// are typically theme-controlled; 16..=255 are the fixed cube/ramp.
#[derive(Debug, Clone)]
pub struct Palette {
    ansi16: [Rgb; 16],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            ansi16: [
                (0x00, 0x00, 0x00),
                (0xcd, 0x00, 0x00),
                (0x00, 0xcd, 0x00),
                (0xcd, 0xcd, 0x00),
                (0x00, 0x00, 0xee),
                (0xcd, 0x00, 0xcd),
                (0x00, 0xcd, 0xcd),
                (0xe5, 0xe5, 0xe5),
                (0x7f, 0x7f, 0x7f),
                (0xff, 0x00, 0x00),
                (0x00, 0xff, 0x00),
                (0xff, 0xff, 0x00),
                (0x5c, 0x5c, 0xff),
                (0xff, 0x00, 0xff),
                (0x00, 0xff, 0xff),
                (0xff, 0xff, 0xff),
            ],
        }
    }
}

impl Palette {
    pub fn resolve_indexed(&self, index: u8) -> Rgb {
        match index {
            0..=15 => self.ansi16[index as usize],
            other => indexed_to_rgb(other),
        }
    }
}

/// Default colors used when a `Color::Default` source needs resolving.
#[derive(Debug, Clone, Copy)]
pub struct DefaultColors {
    pub foreground: Rgb,
    pub background: Rgb,
}

impl Default for DefaultColors {
    fn default() -> Self {
        Self {
            foreground: (0xe5, 0xe5, 0xe5),
            background: (0x00, 0x00, 0x00),
        }
    }
}

bitflags! {
    /// Boolean style flags on a cell/pen. Underline is a style selector,
    /// not a flag: its presence is represented by `underline_style != None`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct CellAttrs: u16 {
        const BOLD          = 1 << 0;
        const FAINT         = 1 << 1;
        const ITALIC        = 1 << 2;
        const BLINK         = 1 << 3;
        const STRIKETHROUGH = 1 << 4;
        const INVERSE       = 1 << 5;
        const INVISIBLE     = 1 << 6;
    }
}

/// Underline rendering style (SGR 4:n or SGR 21 for double underline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    Wavy,
    Dotted,
    Dashed,
}

/// Identifier for a cell's hyperlink (OSC 8) or tile glyph, interned by the host.
pub type HyperlinkId = u32;
pub type TileId = u32;

/// The pen the cursor paints with, and the per-cell style a [`crate::row::Row`]
/// run carries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextAttributes {
    pub fg: Color,
    pub bg: Color,
    pub underline_color: Color,
    pub flags: CellAttrs,
    pub underline_style: UnderlineStyle,
    pub hyperlink: Option<HyperlinkId>,
}

/// Resolved, renderer-ready colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColors {
    pub fg: Rgb,
    pub bg: Rgb,
    pub underline: Rgb,
}

fn resolve_source(source: Color, default: Rgb, palette: &Palette) -> Rgb {
    match source {
        Color::Default => default,
        Color::Indexed(i) => palette.resolve_indexed(i),
        Color::Rgb(r, g, b) => (r, g, b),
    }
}

fn bold_as_bright(source: Color, bold: bool) -> Color {
    if bold {
        if let Color::Indexed(i) = source {
            if i < 8 {
                return Color::Indexed(i + 8);
            }
        }
    }
    source
}

fn mix_toward_black(c: Rgb) -> Rgb {
    // Faint: mix 1/3 of the way toward black (i.e. scale by 2/3).
    (
        (c.0 as u32 * 2 / 3) as u8,
        (c.1 as u32 * 2 / 3) as u8,
        (c.2 as u32 * 2 / 3) as u8,
    )
}

impl TextAttributes {
    /// Resolve sources into concrete colors, applying bold-as-bright,
    /// inverse, invisible and faint per spec.md §4.1.
    pub fn resolve(&self, palette: &Palette, defaults: DefaultColors) -> ResolvedColors {
        let bold = self.flags.contains(CellAttrs::BOLD);
        let fg_source = bold_as_bright(self.fg, bold);

        let mut fg = resolve_source(fg_source, defaults.foreground, palette);
        let mut bg = resolve_source(self.bg, defaults.background, palette);
        let underline = resolve_source(self.underline_color, fg, palette);

        if self.flags.contains(CellAttrs::INVERSE) {
            std::mem::swap(&mut fg, &mut bg);
        }
        if self.flags.contains(CellAttrs::INVISIBLE) {
            fg = bg;
        }
        if self.flags.contains(CellAttrs::FAINT) {
            fg = mix_toward_black(fg);
        }

        ResolvedColors { fg, bg, underline }
    }

    /// True iff two attribute sets may be concatenated into one styled run.
    /// Callers must additionally check wide/tile cell boundaries; this only
    /// compares style.
    pub fn matches_container(&self, other: &TextAttributes) -> bool {
        self == other
    }

    pub fn is_default(&self) -> bool {
        *self == TextAttributes::default()
    }

    /// SGR 0: reset all sources, flags, and underline style; clear any
    /// active hyperlink. Per spec.md §4.1, wide/ASCII-fast-path state lives
    /// on the `Cell`, not here, so it is untouched by construction.
    pub fn sgr_reset(&mut self) {
        *self = TextAttributes::default();
    }
}

bitflags! {
    /// Per-cell flags independent of style: wide-character tracking and
    /// the ASCII fast path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct CellFlags: u8 {
        /// Left half of a double-width glyph.
        const WIDE_CHAR   = 1 << 0;
        /// Trailing spacer half of a double-width glyph.
        const WIDE_SPACER = 1 << 1;
        /// Line wrapped after this cell (set on the last column of a row
        /// whose content continues onto the next row).
        const WRAP        = 1 << 2;
    }
}

/// A single terminal cell: either a narrow/ASCII character, the left half
/// of a wide glyph, a wide spacer, or a tile glyph reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub c: char,
    pub attrs: TextAttributes,
    pub flags: CellFlags,
    pub tile: Option<TileId>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            c: ' ',
            attrs: TextAttributes::default(),
            flags: CellFlags::empty(),
            tile: None,
        }
    }
}

impl Cell {
    pub fn wide_spacer() -> Self {
        Self {
            c: ' ',
            flags: CellFlags::WIDE_SPACER,
            ..Default::default()
        }
    }

    pub fn is_wide_spacer(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_SPACER)
    }

    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CHAR)
    }

    /// Reset to the hard-default blank cell.
    pub fn clear(&mut self) {
        *self = Cell::default();
    }

    /// Erase to blank, but preserve the given background (ECMA-48 "bce").
    pub fn erase(&mut self, bg: Color) {
        let mut attrs = TextAttributes::default();
        attrs.bg = bg;
        *self = Cell {
            c: ' ',
            attrs,
            flags: CellFlags::empty(),
            tile: None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_promotes_dark_palette_index_to_bright() {
        let attrs = TextAttributes {
            fg: Color::Indexed(1),
            flags: CellAttrs::BOLD,
            ..Default::default()
        };
        let resolved = attrs.resolve(&Palette::default(), DefaultColors::default());
        assert_eq!(resolved.fg, indexed_to_rgb(9));
    }

    #[test]
    fn inverse_swaps_after_default_expansion() {
        let attrs = TextAttributes {
            flags: CellAttrs::INVERSE,
            ..Default::default()
        };
        let defaults = DefaultColors::default();
        let resolved = attrs.resolve(&Palette::default(), defaults);
        assert_eq!(resolved.fg, defaults.background);
        assert_eq!(resolved.bg, defaults.foreground);
    }

    #[test]
    fn invisible_forces_fg_to_bg() {
        let attrs = TextAttributes {
            bg: Color::Rgb(1, 2, 3),
            flags: CellAttrs::INVISIBLE,
            ..Default::default()
        };
        let resolved = attrs.resolve(&Palette::default(), DefaultColors::default());
        assert_eq!(resolved.fg, (1, 2, 3));
    }

    #[test]
    fn faint_mixes_toward_black() {
        let attrs = TextAttributes {
            fg: Color::Rgb(90, 90, 90),
            flags: CellAttrs::FAINT,
            ..Default::default()
        };
        let resolved = attrs.resolve(&Palette::default(), DefaultColors::default());
        assert_eq!(resolved.fg, (60, 60, 60));
    }

    #[test]
    fn sgr_reset_clears_hyperlink_but_not_cell_flags() {
        let mut attrs = TextAttributes {
            fg: Color::Indexed(3),
            hyperlink: Some(7),
            ..Default::default()
        };
        attrs.sgr_reset();
        assert!(attrs.is_default());

        let mut cell = Cell::default();
        cell.flags = CellFlags::WIDE_CHAR;
        cell.attrs.sgr_reset();
        assert!(cell.flags.contains(CellFlags::WIDE_CHAR));
    }
}
