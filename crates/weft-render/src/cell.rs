#![forbid(unsafe_code)]

//! Cells: one character position on the screen with its style.
//!
//! A wide glyph occupies its head cell plus one [`Cell::CONTINUATION`] cell to
//! the right. Continuation cells carry no content of their own; they are
//! skipped when text is extracted or emitted, since the terminal advances past
//! them when it draws the head.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

use crate::color::Color;
use crate::style::Style;

bitflags! {
    /// Text attributes applied through SGR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const REVERSE   = 0b0001_0000;
    }
}

/// One screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: StyleFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl Cell {
    /// A space with no style.
    pub const BLANK: Self = Self {
        ch: ' ',
        fg: None,
        bg: None,
        attrs: StyleFlags::empty(),
    };

    /// Placeholder for the right half of a wide glyph.
    pub const CONTINUATION: Self = Self {
        ch: '\0',
        fg: None,
        bg: None,
        attrs: StyleFlags::empty(),
    };

    #[inline]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            fg: None,
            bg: None,
            attrs: StyleFlags::empty(),
        }
    }

    /// This cell with `style` applied on top of its current attributes.
    #[must_use]
    pub fn styled(self, style: Style) -> Self {
        style.apply(self)
    }

    /// This cell with a control character replaced by a space.
    ///
    /// Continuations keep their marker.
    #[inline]
    #[must_use]
    pub fn printable(self) -> Self {
        if self.ch.is_control() && !self.is_continuation() {
            Self { ch: ' ', ..self }
        } else {
            self
        }
    }

    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.ch == '\0'
    }

    /// Columns the glyph occupies: 0 for continuations, else 1 or 2.
    #[inline]
    pub fn width(&self) -> u16 {
        if self.is_continuation() {
            return 0;
        }
        match self.ch.width() {
            Some(2) => 2,
            _ => 1,
        }
    }

    pub fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            attrs: self.attrs,
        }
    }

    pub fn bold(&self) -> bool {
        self.attrs.contains(StyleFlags::BOLD)
    }

    pub fn dim(&self) -> bool {
        self.attrs.contains(StyleFlags::DIM)
    }

    pub fn italic(&self) -> bool {
        self.attrs.contains(StyleFlags::ITALIC)
    }

    pub fn underline(&self) -> bool {
        self.attrs.contains(StyleFlags::UNDERLINE)
    }

    pub fn reverse(&self) -> bool {
        self.attrs.contains(StyleFlags::REVERSE)
    }
}
