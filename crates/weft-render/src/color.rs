#![forbid(unsafe_code)]

//! Terminal colors and depth downgrading.
//!
//! A [`Color`] is stored at whatever precision it was specified with and is
//! downgraded to the terminal's [`ColorDepth`] only when escape sequences are
//! generated.

use std::fmt;
use std::str::FromStr;

use weft_core::TerminalCapabilities;

/// A foreground or background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// One of the 16 standard colors (0-7 normal, 8-15 bright).
    Ansi(u8),
    /// An entry in the 256-color palette.
    Indexed(u8),
    /// 24-bit color.
    Rgb(u8, u8, u8),
}

impl Color {
    pub const BLACK: Color = Color::Ansi(0);
    pub const RED: Color = Color::Ansi(1);
    pub const GREEN: Color = Color::Ansi(2);
    pub const YELLOW: Color = Color::Ansi(3);
    pub const BLUE: Color = Color::Ansi(4);
    pub const MAGENTA: Color = Color::Ansi(5);
    pub const CYAN: Color = Color::Ansi(6);
    pub const WHITE: Color = Color::Ansi(7);
    pub const GRAY: Color = Color::Ansi(8);

    /// The approximate RGB value, using the xterm default palette.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Ansi(n) => ANSI_PALETTE[usize::from(n & 0x0F)],
            Color::Indexed(n) => indexed_to_rgb(n),
        }
    }

    /// Reduce precision to what `depth` can display.
    pub fn downgrade(self, depth: ColorDepth) -> Color {
        match (self, depth) {
            (_, ColorDepth::TrueColor) | (Color::Ansi(_), _) => self,
            (Color::Indexed(n), ColorDepth::Ansi256) => Color::Indexed(n),
            (Color::Rgb(r, g, b), ColorDepth::Ansi256) => Color::Indexed(rgb_to_256(r, g, b)),
            (Color::Indexed(n), ColorDepth::Ansi16) if n < 16 => Color::Ansi(n),
            (color, ColorDepth::Ansi16) => {
                let (r, g, b) = color.to_rgb();
                Color::Ansi(rgb_to_16(r, g, b))
            }
        }
    }
}

/// How many colors the terminal can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorDepth {
    Ansi16,
    Ansi256,
    TrueColor,
}

impl ColorDepth {
    pub fn from_capabilities(caps: &TerminalCapabilities) -> Self {
        if caps.true_color {
            ColorDepth::TrueColor
        } else if caps.colors_256 {
            ColorDepth::Ansi256
        } else {
            ColorDepth::Ansi16
        }
    }
}

const ANSI_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn indexed_to_rgb(n: u8) -> (u8, u8, u8) {
    match n {
        0..=15 => ANSI_PALETTE[usize::from(n)],
        16..=231 => {
            let i = n - 16;
            (
                CUBE_LEVELS[usize::from(i / 36)],
                CUBE_LEVELS[usize::from((i / 6) % 6)],
                CUBE_LEVELS[usize::from(i % 6)],
            )
        }
        _ => {
            let v = 8 + (n - 232) * 10;
            (v, v, v)
        }
    }
}

fn nearest_cube_level(v: u8) -> u8 {
    let mut best = 0u8;
    for (i, level) in CUBE_LEVELS.iter().enumerate() {
        if level.abs_diff(v) < CUBE_LEVELS[usize::from(best)].abs_diff(v) {
            best = i as u8;
        }
    }
    best
}

fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        return match r {
            0..=3 => 16,
            248..=255 => 231,
            v => 232 + ((v - 8) / 10).min(23),
        };
    }
    16 + 36 * nearest_cube_level(r) + 6 * nearest_cube_level(g) + nearest_cube_level(b)
}

fn rgb_to_16(r: u8, g: u8, b: u8) -> u8 {
    let distance = |(pr, pg, pb): (u8, u8, u8)| {
        let dr = i32::from(pr) - i32::from(r);
        let dg = i32::from(pg) - i32::from(g);
        let db = i32::from(pb) - i32::from(b);
        dr * dr + dg * dg + db * db
    };
    let mut best = 0;
    for (i, rgb) in ANSI_PALETTE.iter().enumerate() {
        if distance(*rgb) < distance(ANSI_PALETTE[best]) {
            best = i;
        }
    }
    best as u8
}

/// A color name or literal that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color {0:?}")]
pub struct ColorParseError(String);

const COLOR_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `red`, `bright_red`, `gray`, `#rrggbb`, `#rgb` and palette
    /// indices `0`-`255`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_string());
        let name = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");

        if let Some(hex) = name.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }
        if let Ok(index) = name.parse::<u8>() {
            return Ok(Color::Indexed(index));
        }
        if name == "gray" || name == "grey" {
            return Ok(Color::GRAY);
        }
        let (base, bright) = match name.strip_prefix("bright_") {
            Some(base) => (base, 8),
            None => (name.as_str(), 0),
        };
        COLOR_NAMES
            .iter()
            .position(|candidate| *candidate == base)
            .map(|i| Color::Ansi(i as u8 + bright))
            .ok_or_else(err)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            Some(Color::Rgb(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Ansi(n) if n < 8 => f.write_str(COLOR_NAMES[usize::from(n)]),
            Color::Ansi(n) => write!(f, "bright_{}", COLOR_NAMES[usize::from(n & 7)]),
            Color::Indexed(n) => write!(f, "{n}"),
            Color::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}
