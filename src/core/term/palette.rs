//! Color palettes.
//!
//! Cells store color *references* ([`Color`]); a [`Palette`] turns them into
//! concrete RGB values at render time. The 16 named colors come from the
//! palette, indexes 16..=255 follow the xterm 6x6x6 cube and gray ramp, and
//! truecolor passes through unchanged.

use super::state::Color;

/// A concrete display color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Named terminal colors plus the default foreground and background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub foreground: Rgb,
    pub background: Rgb,
    /// Black, red, green, yellow, blue, magenta, cyan, white, then the
    /// bright variants in the same order
    pub ansi: [Rgb; 16],
    /// Background of multi-select highlights
    pub highlight_bg: Rgb,
    pub highlight_fg: Rgb,
    pub selection_bg: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::light()
    }
}

impl Palette {
    /// The default light IDE theme
    pub fn light() -> Self {
        Self {
            name: "light-ide",
            foreground: Rgb::new(0x24, 0x29, 0x2e),
            background: Rgb::new(0xe0, 0xe0, 0xe0),
            ansi: [
                Rgb::new(0x24, 0x29, 0x2e),
                Rgb::new(0xcf, 0x22, 0x2e),
                Rgb::new(0x11, 0x63, 0x29),
                Rgb::new(0x95, 0x38, 0x00),
                Rgb::new(0x05, 0x50, 0xae),
                Rgb::new(0x82, 0x50, 0xdf),
                Rgb::new(0x09, 0x69, 0xda),
                Rgb::new(0x6e, 0x77, 0x81),
                Rgb::new(0x57, 0x60, 0x6a),
                Rgb::new(0xff, 0x81, 0x82),
                Rgb::new(0x4a, 0xc2, 0x6b),
                Rgb::new(0xd4, 0xa7, 0x2c),
                Rgb::new(0x54, 0xae, 0xff),
                Rgb::new(0xc2, 0x97, 0xff),
                Rgb::new(0x76, 0xe3, 0xea),
                Rgb::new(0xff, 0xff, 0xff),
            ],
            highlight_bg: Rgb::new(0xff, 0xa6, 0x2b),
            highlight_fg: Rgb::new(0x00, 0x00, 0x00),
            selection_bg: Rgb::new(0xa8, 0xc8, 0xe8),
        }
    }

    /// Classic xterm colors on black
    pub fn dark() -> Self {
        Self {
            name: "dark",
            foreground: Rgb::new(0xe5, 0xe5, 0xe5),
            background: Rgb::new(0x1e, 0x1e, 0x1e),
            ansi: [
                Rgb::new(0x00, 0x00, 0x00),
                Rgb::new(0xcd, 0x00, 0x00),
                Rgb::new(0x00, 0xcd, 0x00),
                Rgb::new(0xcd, 0xcd, 0x00),
                Rgb::new(0x00, 0x00, 0xee),
                Rgb::new(0xcd, 0x00, 0xcd),
                Rgb::new(0x00, 0xcd, 0xcd),
                Rgb::new(0xe5, 0xe5, 0xe5),
                Rgb::new(0x7f, 0x7f, 0x7f),
                Rgb::new(0xff, 0x00, 0x00),
                Rgb::new(0x00, 0xff, 0x00),
                Rgb::new(0xff, 0xff, 0x00),
                Rgb::new(0x5c, 0x5c, 0xff),
                Rgb::new(0xff, 0x00, 0xff),
                Rgb::new(0x00, 0xff, 0xff),
                Rgb::new(0xff, 0xff, 0xff),
            ],
            highlight_bg: Rgb::new(0xff, 0xa6, 0x2b),
            highlight_fg: Rgb::new(0x00, 0x00, 0x00),
            selection_bg: Rgb::new(0x26, 0x4f, 0x78),
        }
    }

    /// Palette by theme name; unknown names fall back to the light theme
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dark" => Self::dark(),
            _ => Self::light(),
        }
    }

    /// List available palettes
    pub fn list() -> Vec<&'static str> {
        vec!["light-ide", "dark"]
    }

    pub fn fg(&self, color: Color) -> Rgb {
        self.resolve(color, self.foreground)
    }

    pub fn bg(&self, color: Color) -> Rgb {
        self.resolve(color, self.background)
    }

    fn resolve(&self, color: Color, default: Rgb) -> Rgb {
        match color {
            Color::Default => default,
            Color::Indexed(n) if n < 16 => self.ansi[n as usize],
            Color::Indexed(n) if n < 232 => {
                let n = n - 16;
                let level = |v: u8| if v == 0 { 0 } else { 55 + v * 40 };
                Rgb::new(level(n / 36), level((n / 6) % 6), level(n % 6))
            }
            Color::Indexed(n) => {
                let gray = 8 + (n - 232) * 10;
                Rgb::new(gray, gray, gray)
            }
            Color::Rgb(r, g, b) => Rgb::new(r, g, b),
        }
    }
}
