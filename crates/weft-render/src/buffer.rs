#![forbid(unsafe_code)]

//! Screen buffer: the grid of cells one frame paints into.
//!
//! # Layout
//!
//! Cells are stored in row-major order: `index = y * width + x`.
//!
//! # Dirty Tracking
//!
//! Every write that changes a cell records that cell as a dirty region.
//! Callers may also mark whole areas dirty. The diff renderer only scans the
//! bounding box of the dirty regions, so a buffer with no dirty regions
//! renders to nothing.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. Dirty regions always lie inside the buffer
//! 3. A wide glyph's head is always followed by a continuation cell; writes
//!    that would split a pair blank the orphaned half
//! 4. The scissor stack always holds at least the full-buffer rectangle

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;
use weft_core::geometry::Bounds;
use weft_core::text_width::grapheme_width;

use crate::cell::Cell;
use crate::style::Style;

/// A 2D grid of terminal cells with dirty-region tracking.
///
/// ```
/// use weft_render::buffer::ScreenBuffer;
/// use weft_render::style::Style;
///
/// let mut buffer = ScreenBuffer::new(10, 2);
/// buffer.put_str(0, 0, "Hi", Style::default());
/// assert_eq!(buffer.row_text(0), "Hi        ");
/// ```
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty: HashSet<Bounds>,
    scissor_stack: Vec<Bounds>,
}

impl Default for ScreenBuffer {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl ScreenBuffer {
    /// Create a blank buffer. Zero dimensions are allowed and hold no cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; usize::from(width) * usize::from(height)],
            dirty: HashSet::new(),
            scissor_stack: vec![Bounds::sized(width, height)],
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub const fn bounds(&self) -> Bounds {
        Bounds::sized(self.width, self.height)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// All cells of row `y`; empty when out of range.
    pub fn row(&self, y: u16) -> &[Cell] {
        if y >= self.height {
            return &[];
        }
        let start = usize::from(y) * usize::from(self.width);
        &self.cells[start..start + usize::from(self.width)]
    }

    /// Store `cell` at `(x, y)`. Control characters are stored as spaces.
    ///
    /// Returns `true` when the stored cell changed; the cell is then recorded
    /// as dirty. Out-of-range positions are ignored. No scissor or wide-glyph
    /// handling is applied; use [`put_char`](Self::put_char) for that.
    pub fn set_cell(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let cell = cell.printable();
        if self.cells[idx] == cell {
            return false;
        }
        self.cells[idx] = cell;
        self.dirty.insert(Bounds::new(x, y, 1, 1));
        true
    }

    /// Write one glyph at `(x, y)` inside the current scissor.
    ///
    /// Wide glyphs are written atomically: if both columns are not writable,
    /// nothing is written. Returns the number of columns written.
    pub fn put_cell(&mut self, x: u16, y: u16, cell: Cell) -> u16 {
        let width = cell.width();
        if width == 0 {
            return 0;
        }
        let scissor = self.current_scissor();
        for dx in 0..width {
            let Some(cx) = x.checked_add(dx) else {
                return 0;
            };
            if self.index(cx, y).is_none() || !scissor.contains_point(cx, y) {
                return 0;
            }
        }

        for dx in 0..width {
            self.cleanup_overlap(x + dx, y);
        }
        self.set_cell(x, y, cell);
        if width == 2 {
            self.set_cell(x + 1, y, Cell::CONTINUATION);
        }
        width
    }

    /// Write a character with `style` applied.
    pub fn put_char(&mut self, x: u16, y: u16, ch: char, style: Style) -> u16 {
        self.put_cell(x, y, style.apply(Cell::new(ch)))
    }

    /// Write a string starting at `(x, y)`, clipped at the right edge.
    ///
    /// Each grapheme cluster takes one cell (its first character); combining
    /// marks and zero-width clusters are dropped. Returns the columns
    /// advanced, which may include scissored cells.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, style: Style) -> u16 {
        let mut col = x;
        for grapheme in text.graphemes(true) {
            let width = grapheme_width(grapheme) as u16;
            if width == 0 {
                continue;
            }
            if u32::from(col) + u32::from(width) > u32::from(self.width) {
                break;
            }
            if let Some(ch) = grapheme.chars().next() {
                self.put_char(col, y, ch, style);
            }
            col += width;
        }
        col - x
    }

    /// Fill `area` (clipped to the buffer and scissor) with `cell`.
    pub fn fill(&mut self, area: Bounds, cell: Cell) {
        let Some(area) = area.intersection(&self.current_scissor()) else {
            return;
        };
        let step = cell.width().max(1);
        for y in area.top()..area.bottom() {
            let mut x = area.left();
            while x < area.right() {
                self.put_cell(x, y, cell);
                x = x.saturating_add(step);
            }
        }
    }

    /// Reset every cell to blank, ignoring the scissor.
    pub fn clear(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set_cell(x, y, Cell::BLANK);
            }
        }
    }

    // ------------------------------------------------------------------
    // Dirty regions
    // ------------------------------------------------------------------

    /// Record `area` as needing repaint. Parts outside the buffer are dropped.
    pub fn mark_dirty(&mut self, area: Bounds) {
        if let Some(clipped) = area.intersection(&self.bounds()) {
            self.dirty.insert(clipped);
        }
    }

    pub fn mark_all_dirty(&mut self) {
        self.mark_dirty(self.bounds());
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_regions(&self) -> impl Iterator<Item = &Bounds> {
        self.dirty.iter()
    }

    /// Bounding box of every dirty region.
    pub fn dirty_union(&self) -> Option<Bounds> {
        self.dirty
            .iter()
            .copied()
            .reduce(|acc, region| acc.union(&region))
            .and_then(|union| union.intersection(&self.bounds()))
    }

    // ------------------------------------------------------------------
    // Scissor
    // ------------------------------------------------------------------

    /// Restrict subsequent glyph writes to `area` intersected with the
    /// current scissor.
    pub fn push_scissor(&mut self, area: Bounds) {
        let top = self.current_scissor();
        let next = top
            .intersection(&area)
            .unwrap_or(Bounds::new(area.x, area.y, 0, 0));
        self.scissor_stack.push(next);
    }

    /// Drop the innermost scissor. The full-buffer base is never popped.
    pub fn pop_scissor(&mut self) {
        if self.scissor_stack.len() > 1 {
            self.scissor_stack.pop();
        }
    }

    pub fn current_scissor(&self) -> Bounds {
        self.scissor_stack
            .last()
            .copied()
            .unwrap_or_else(|| self.bounds())
    }

    pub fn scissor_depth(&self) -> usize {
        self.scissor_stack.len()
    }

    // ------------------------------------------------------------------
    // Resize and extraction
    // ------------------------------------------------------------------

    /// Change dimensions, keeping the overlapping content.
    ///
    /// Existing dirty regions and scissors are discarded and the whole new
    /// area is marked dirty.
    pub fn resize(&mut self, width: u16, height: u16) {
        let mut next = ScreenBuffer::new(width, height);
        let copy_w = self.width.min(width);
        for y in 0..self.height.min(height) {
            for x in 0..copy_w {
                if let (Some(src), Some(dst)) = (self.index(x, y), next.index(x, y)) {
                    next.cells[dst] = self.cells[src];
                }
            }
            // A wide head whose continuation fell off the new edge.
            if copy_w > 0
                && let Some(last) = next.index(copy_w - 1, y)
                && next.cells[last].width() == 2
                && copy_w == width
            {
                next.cells[last] = Cell::BLANK;
            }
        }
        *self = next;
        self.mark_all_dirty();
    }

    /// Text of row `y`, continuation cells skipped.
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .iter()
            .filter(|cell| !cell.is_continuation())
            .map(|cell| cell.ch)
            .collect()
    }

    /// All rows joined with `\n`.
    pub fn to_text(&self) -> String {
        (0..self.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compare cell contents only, ignoring dirty state and scissors.
    pub fn content_eq(&self, other: &ScreenBuffer) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }

    fn cleanup_overlap(&mut self, x: u16, y: u16) {
        let Some(current) = self.get(x, y).copied() else {
            return;
        };
        if current.width() == 2 {
            if self
                .get(x + 1, y)
                .is_some_and(|tail| tail.is_continuation())
            {
                self.set_cell(x + 1, y, Cell::BLANK);
            }
        } else if current.is_continuation()
            && x > 0
            && self.get(x - 1, y).is_some_and(|head| head.width() == 2)
        {
            self.set_cell(x - 1, y, Cell::BLANK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn zero_sized_buffer() {
        let mut buffer = ScreenBuffer::new(0, 0);
        assert!(buffer.is_empty());
        assert!(!buffer.set_cell(0, 0, Cell::new('x')));
        assert_eq!(buffer.to_text(), "");
        assert_eq!(buffer.dirty_union(), None);
    }

    #[test]
    fn set_cell_reports_changes_and_marks_dirty() {
        let mut buffer = ScreenBuffer::new(4, 2);
        assert!(buffer.set_cell(1, 1, Cell::new('a')));
        assert!(!buffer.set_cell(1, 1, Cell::new('a')));
        assert!(!buffer.set_cell(9, 9, Cell::new('a')));
        assert_eq!(buffer.dirty_union(), Some(Bounds::new(1, 1, 1, 1)));
    }

    #[test]
    fn control_characters_never_reach_cells() {
        let mut buffer = ScreenBuffer::new(3, 2);
        buffer.set_cell(1, 0, Cell::new('\x07'));
        assert_eq!(buffer.row_text(0), "   ");
        assert_eq!(buffer.put_str(0, 1, "a\u{85}b", Style::default()), 2);
        assert_eq!(buffer.row_text(1), "ab ");
    }

    #[test]
    fn unchanged_write_is_not_dirty() {
        let mut buffer = ScreenBuffer::new(4, 2);
        buffer.set_cell(0, 0, Cell::BLANK);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut buffer = ScreenBuffer::new(3, 1);
        assert_eq!(buffer.put_str(1, 0, "hello", Style::default()), 2);
        assert_eq!(buffer.row_text(0), " he");
    }

    #[test]
    fn wide_glyph_writes_continuation() {
        let mut buffer = ScreenBuffer::new(4, 1);
        assert_eq!(buffer.put_str(0, 0, "日a", Style::default()), 3);
        assert_eq!(buffer.get(0, 0).map(|c| c.ch), Some('日'));
        assert!(buffer.get(1, 0).is_some_and(Cell::is_continuation));
        assert_eq!(buffer.row_text(0), "日a ");
    }

    #[test]
    fn wide_glyph_does_not_split_at_edge() {
        let mut buffer = ScreenBuffer::new(3, 1);
        assert_eq!(buffer.put_str(0, 0, "ab日", Style::default()), 2);
        assert_eq!(buffer.row_text(0), "ab ");
    }

    #[test]
    fn overwriting_half_a_wide_glyph_blanks_the_other_half() {
        let mut buffer = ScreenBuffer::new(4, 1);
        buffer.put_str(0, 0, "日", Style::default());
        buffer.put_char(1, 0, 'x', Style::default());
        assert_eq!(buffer.row_text(0), " x  ");

        buffer.put_str(2, 0, "本", Style::default());
        buffer.put_char(2, 0, 'y', Style::default());
        assert_eq!(buffer.row_text(0), " xy ");
    }

    #[test]
    fn styled_put() {
        let mut buffer = ScreenBuffer::new(2, 1);
        buffer.put_char(0, 0, 'z', Style::new().fg(Color::GREEN).bold());
        let cell = buffer.get(0, 0).copied().unwrap_or_default();
        assert_eq!(cell.fg, Some(Color::GREEN));
        assert!(cell.bold());
    }

    #[test]
    fn scissor_clips_writes() {
        let mut buffer = ScreenBuffer::new(6, 2);
        buffer.push_scissor(Bounds::new(2, 0, 2, 1));
        buffer.put_str(0, 0, "abcdef", Style::default());
        buffer.put_str(0, 1, "abcdef", Style::default());
        buffer.pop_scissor();
        assert_eq!(buffer.to_text(), "  cd  \n      ");
        assert_eq!(buffer.scissor_depth(), 1);
        buffer.pop_scissor();
        assert_eq!(buffer.scissor_depth(), 1);
    }

    #[test]
    fn nested_scissors_intersect() {
        let mut buffer = ScreenBuffer::new(10, 1);
        buffer.push_scissor(Bounds::new(0, 0, 5, 1));
        buffer.push_scissor(Bounds::new(3, 0, 5, 1));
        assert_eq!(buffer.current_scissor(), Bounds::new(3, 0, 2, 1));
        buffer.push_scissor(Bounds::new(8, 0, 2, 1));
        assert!(buffer.current_scissor().is_empty());
    }

    #[test]
    fn fill_respects_area() {
        let mut buffer = ScreenBuffer::new(4, 3);
        buffer.fill(Bounds::new(1, 1, 10, 1), Cell::new('#'));
        assert_eq!(buffer.to_text(), "    \n ###\n    ");
    }

    #[test]
    fn dirty_union_covers_all_regions() {
        let mut buffer = ScreenBuffer::new(20, 10);
        buffer.mark_dirty(Bounds::new(1, 1, 2, 2));
        buffer.mark_dirty(Bounds::new(10, 5, 1, 1));
        buffer.mark_dirty(Bounds::new(18, 8, 10, 10));
        assert_eq!(buffer.dirty_union(), Some(Bounds::new(1, 1, 19, 9)));
        buffer.clear_dirty();
        assert_eq!(buffer.dirty_union(), None);
    }

    #[test]
    fn resize_keeps_overlap_and_marks_everything() {
        let mut buffer = ScreenBuffer::new(4, 2);
        buffer.put_str(0, 0, "abcd", Style::default());
        buffer.put_str(0, 1, "efgh", Style::default());
        buffer.resize(2, 3);
        assert_eq!(buffer.to_text(), "ab\nef\n  ");
        assert_eq!(buffer.dirty_union(), Some(Bounds::sized(2, 3)));
    }

    #[test]
    fn resize_drops_split_wide_glyph() {
        let mut buffer = ScreenBuffer::new(4, 1);
        buffer.put_str(2, 0, "日", Style::default());
        buffer.resize(3, 1);
        assert_eq!(buffer.row_text(0), "   ");
    }

    #[test]
    fn clear_resets_cells() {
        let mut buffer = ScreenBuffer::new(3, 1);
        buffer.put_str(0, 0, "abc", Style::default());
        buffer.clear_dirty();
        buffer.clear();
        assert_eq!(buffer.row_text(0), "   ");
        assert_eq!(buffer.dirty_union(), Some(Bounds::new(0, 0, 3, 1)));
    }

    #[test]
    fn content_eq_ignores_dirty_state() {
        let mut a = ScreenBuffer::new(2, 1);
        let b = ScreenBuffer::new(2, 1);
        a.mark_all_dirty();
        assert!(a.content_eq(&b));
    }
}
