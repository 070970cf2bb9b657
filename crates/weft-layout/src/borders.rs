#![forbid(unsafe_code)]

//! Border sides and glyph sets.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    /// Which sides of a frame carry a border.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Borders: u8 {
        const TOP    = 0b0001;
        const RIGHT  = 0b0010;
        const BOTTOM = 0b0100;
        const LEFT   = 0b1000;
        const ALL    = Self::TOP.bits() | Self::RIGHT.bits() | Self::BOTTOM.bits() | Self::LEFT.bits();
    }
}

impl Default for Borders {
    fn default() -> Self {
        Borders::ALL
    }
}

/// Glyphs used to draw a border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderSet {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BorderSet {
    pub const PLAIN: Self = Self::new('┌', '┐', '└', '┘', '─', '│');
    pub const ROUNDED: Self = Self::new('╭', '╮', '╰', '╯', '─', '│');
    pub const DOUBLE: Self = Self::new('╔', '╗', '╚', '╝', '═', '║');
    pub const HEAVY: Self = Self::new('┏', '┓', '┗', '┛', '━', '┃');
    pub const ASCII: Self = Self::new('+', '+', '+', '+', '-', '|');

    const fn new(
        top_left: char,
        top_right: char,
        bottom_left: char,
        bottom_right: char,
        horizontal: char,
        vertical: char,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            horizontal,
            vertical,
        }
    }
}

/// Border drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderType {
    #[default]
    Plain,
    Rounded,
    Double,
    Heavy,
    Ascii,
    /// No border at all; the frame takes no chrome.
    None,
}

impl BorderType {
    /// Glyphs for this style. Terminals without Unicode get ASCII.
    pub fn to_border_set(self, unicode: bool) -> Option<BorderSet> {
        if self == BorderType::None {
            return None;
        }
        if !unicode {
            return Some(BorderSet::ASCII);
        }
        Some(match self {
            BorderType::Plain => BorderSet::PLAIN,
            BorderType::Rounded => BorderSet::ROUNDED,
            BorderType::Double => BorderSet::DOUBLE,
            BorderType::Heavy => BorderSet::HEAVY,
            BorderType::Ascii | BorderType::None => BorderSet::ASCII,
        })
    }

    pub fn is_visible(self) -> bool {
        self != BorderType::None
    }
}

/// An unknown border style name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown border type {0:?}")]
pub struct BorderTypeParseError(String);

impl FromStr for BorderType {
    type Err = BorderTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "single" | "square" => Ok(BorderType::Plain),
            "rounded" | "round" => Ok(BorderType::Rounded),
            "double" => Ok(BorderType::Double),
            "heavy" | "thick" => Ok(BorderType::Heavy),
            "ascii" => Ok(BorderType::Ascii),
            "none" | "" => Ok(BorderType::None),
            _ => Err(BorderTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for BorderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BorderType::Plain => "plain",
            BorderType::Rounded => "rounded",
            BorderType::Double => "double",
            BorderType::Heavy => "heavy",
            BorderType::Ascii => "ascii",
            BorderType::None => "none",
        })
    }
}

/// Scrollbar glyphs: `(track, thumb)`.
pub const fn scrollbar_glyphs(unicode: bool) -> (char, char) {
    if unicode { ('│', '█') } else { ('|', '#') }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("Rounded".parse::<BorderType>(), Ok(BorderType::Rounded));
        assert_eq!("none".parse::<BorderType>(), Ok(BorderType::None));
        assert!("dotted".parse::<BorderType>().is_err());
    }

    #[test]
    fn ascii_fallback() {
        assert_eq!(BorderType::Double.to_border_set(false), Some(BorderSet::ASCII));
        assert_eq!(BorderType::Double.to_border_set(true), Some(BorderSet::DOUBLE));
        assert_eq!(BorderType::None.to_border_set(true), None);
    }

    #[test]
    fn all_contains_each_side() {
        for side in [Borders::TOP, Borders::RIGHT, Borders::BOTTOM, Borders::LEFT] {
            assert!(Borders::ALL.contains(side));
        }
    }
}
