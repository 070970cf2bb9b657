#![forbid(unsafe_code)]

//! Element-relative painting.
//!
//! A [`PaintContext`] gives an element a coordinate system whose origin is
//! its own top-left corner. The origin may lie off-screen (negative when an
//! ancestor is scrolled), so it is kept as `i32`. Writes outside the element's
//! size are dropped here; writes outside the visible area are dropped by the
//! buffer's scissor, which the caller sets up before handing out the context.

use unicode_segmentation::UnicodeSegmentation;
use weft_core::TerminalCapabilities;
use weft_core::geometry::Bounds;
use weft_core::text_width::{grapheme_width, wrap_line};

use crate::buffer::ScreenBuffer;
use crate::cell::Cell;
use crate::style::Style;

pub struct PaintContext<'a> {
    buffer: &'a mut ScreenBuffer,
    origin_x: i32,
    origin_y: i32,
    width: u16,
    height: u16,
    wrap: bool,
    caps: TerminalCapabilities,
}

impl<'a> PaintContext<'a> {
    /// A context covering `area` of the screen.
    pub fn new(buffer: &'a mut ScreenBuffer, area: Bounds, caps: TerminalCapabilities) -> Self {
        Self::with_origin(
            buffer,
            i32::from(area.x),
            i32::from(area.y),
            area.width,
            area.height,
            caps,
        )
    }

    /// A context whose origin may be off-screen.
    pub fn with_origin(
        buffer: &'a mut ScreenBuffer,
        origin_x: i32,
        origin_y: i32,
        width: u16,
        height: u16,
        caps: TerminalCapabilities,
    ) -> Self {
        Self {
            buffer,
            origin_x,
            origin_y,
            width,
            height,
            wrap: false,
            caps,
        }
    }

    /// Enable soft wrapping for [`put_text`](Self::put_text).
    #[must_use]
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Whether non-ASCII glyphs (box drawing, arrows) are safe to use.
    #[inline]
    pub fn unicode(&self) -> bool {
        self.caps.unicode
    }

    pub fn capabilities(&self) -> &TerminalCapabilities {
        &self.caps
    }

    /// Screen area currently writable.
    pub fn visible_area(&self) -> Bounds {
        self.buffer.current_scissor()
    }

    fn to_screen(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let x = u16::try_from(self.origin_x + i32::from(col)).ok()?;
        let y = u16::try_from(self.origin_y + i32::from(row)).ok()?;
        Some((x, y))
    }

    /// Write one cell at element-relative `(col, row)`.
    ///
    /// Returns whether anything was written.
    pub fn set(&mut self, col: u16, row: u16, cell: Cell) -> bool {
        if cell.width() == 2 && col.saturating_add(1) >= self.width {
            return false;
        }
        match self.to_screen(col, row) {
            Some((x, y)) => self.buffer.put_cell(x, y, cell) > 0,
            None => false,
        }
    }

    /// Write a single line of text, truncated at the element's right edge.
    ///
    /// Returns the columns consumed.
    pub fn put_str(&mut self, col: u16, row: u16, text: &str, style: Style) -> u16 {
        let mut at = col;
        for grapheme in text.graphemes(true) {
            let w = grapheme_width(grapheme) as u16;
            if w == 0 {
                continue;
            }
            if u32::from(at) + u32::from(w) > u32::from(self.width) {
                break;
            }
            if let Some(ch) = grapheme.chars().next() {
                self.set(at, row, style.apply(Cell::new(ch)));
            }
            at += w;
        }
        at - col
    }

    /// Write multi-line text from the top-left corner.
    ///
    /// With wrapping enabled each line is soft-wrapped at the element width;
    /// otherwise lines are truncated. Returns the rows produced.
    pub fn put_text(&mut self, text: &str, style: Style) -> u16 {
        let mut row: u16 = 0;
        for line in text.lines() {
            if self.wrap {
                for piece in wrap_line(line, usize::from(self.width)) {
                    self.put_str(0, row, &piece, style);
                    row = row.saturating_add(1);
                }
            } else {
                self.put_str(0, row, line, style);
                row = row.saturating_add(1);
            }
        }
        row
    }

    /// Fill a rectangle, in element coordinates, with `cell`.
    pub fn fill_rect(&mut self, col: u16, row: u16, width: u16, height: u16, cell: Cell) {
        let right = col.saturating_add(width).min(self.width);
        let bottom = row.saturating_add(height).min(self.height);
        let step = cell.width().max(1);
        for r in row..bottom {
            let mut c = col;
            while c < right {
                self.set(c, r, cell);
                c = c.saturating_add(step);
            }
        }
    }

    /// Paint the whole element area with blank cells in `style`.
    pub fn fill(&mut self, style: Style) {
        self.fill_rect(0, 0, self.width, self.height, style.apply(Cell::BLANK));
    }

    /// A nested context for a sub-rectangle of this one.
    ///
    /// The child shares the buffer and its scissor; its size is clamped to
    /// what remains of this context.
    pub fn sub(&mut self, col: u16, row: u16, width: u16, height: u16) -> PaintContext<'_> {
        let width = width.min(self.width.saturating_sub(col));
        let height = height.min(self.height.saturating_sub(row));
        PaintContext {
            origin_x: self.origin_x + i32::from(col),
            origin_y: self.origin_y + i32::from(row),
            width,
            height,
            wrap: self.wrap,
            caps: self.caps,
            buffer: &mut *self.buffer,
        }
    }
}
