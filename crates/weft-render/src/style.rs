#![forbid(unsafe_code)]

//! Composable text styles.

use crate::cell::{Cell, StyleFlags};
use crate::color::Color;

/// Colors and attributes to apply to cells.
///
/// `None` colors leave the target's color untouched, so styles layer:
/// `base.patch(overlay)` keeps everything `overlay` does not set.
///
/// ```
/// use weft_render::color::Color;
/// use weft_render::style::Style;
///
/// let title = Style::new().fg(Color::CYAN).bold();
/// assert!(title.attrs.contains(weft_render::cell::StyleFlags::BOLD));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub attrs: StyleFlags,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            fg: None,
            bg: None,
            attrs: StyleFlags::empty(),
        }
    }

    #[must_use]
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    #[must_use]
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    #[must_use]
    pub fn attrs(mut self, attrs: StyleFlags) -> Self {
        self.attrs |= attrs;
        self
    }

    #[must_use]
    pub fn bold(self) -> Self {
        self.attrs(StyleFlags::BOLD)
    }

    #[must_use]
    pub fn dim(self) -> Self {
        self.attrs(StyleFlags::DIM)
    }

    #[must_use]
    pub fn italic(self) -> Self {
        self.attrs(StyleFlags::ITALIC)
    }

    #[must_use]
    pub fn underline(self) -> Self {
        self.attrs(StyleFlags::UNDERLINE)
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        self.attrs(StyleFlags::REVERSE)
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::new()
    }

    /// Layer `other` on top of `self`.
    #[must_use]
    pub fn patch(self, other: Style) -> Self {
        Self {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            attrs: self.attrs | other.attrs,
        }
    }

    /// Apply to a cell, keeping the cell's character.
    pub fn apply(&self, cell: Cell) -> Cell {
        Cell {
            ch: cell.ch,
            fg: self.fg.or(cell.fg),
            bg: self.bg.or(cell.bg),
            attrs: cell.attrs | self.attrs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates() {
        let s = Style::new().bold().underline().fg(Color::RED);
        assert_eq!(s.attrs, StyleFlags::BOLD | StyleFlags::UNDERLINE);
        assert_eq!(s.fg, Some(Color::RED));
        assert!(!s.is_plain());
        assert!(Style::default().is_plain());
    }

    #[test]
    fn patch_prefers_overlay() {
        let base = Style::new().fg(Color::WHITE).bg(Color::BLUE);
        let overlay = Style::new().fg(Color::YELLOW).italic();
        let merged = base.patch(overlay);
        assert_eq!(merged.fg, Some(Color::YELLOW));
        assert_eq!(merged.bg, Some(Color::BLUE));
        assert!(merged.attrs.contains(StyleFlags::ITALIC));
    }

    #[test]
    fn apply_keeps_char() {
        let cell = Style::new().reverse().apply(Cell::new('q'));
        assert_eq!(cell.ch, 'q');
        assert!(cell.reverse());
    }
}
