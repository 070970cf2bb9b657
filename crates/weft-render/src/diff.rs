#![forbid(unsafe_code)]

//! Changed-cell computation between two frames.
//!
//! Only the bounding box of the new buffer's dirty regions is scanned. Within
//! it, cells are compared row by row, so the result is in row-major order.
//!
//! ```
//! use weft_render::buffer::ScreenBuffer;
//! use weft_render::cell::Cell;
//! use weft_render::diff::BufferDiff;
//!
//! let old = ScreenBuffer::new(10, 3);
//! let mut new = ScreenBuffer::new(10, 3);
//! new.set_cell(5, 1, Cell::new('X'));
//! new.set_cell(6, 1, Cell::new('Y'));
//!
//! let diff = BufferDiff::compute(&old, &new);
//! assert_eq!(diff.len(), 2);
//! assert_eq!(diff.runs().len(), 1);
//! ```

use crate::buffer::ScreenBuffer;

/// A contiguous run of changed cells on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl ChangeRun {
    #[inline]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        Self { y, x0, x1 }
    }

    #[inline]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x1 < self.x0
    }
}

/// Positions `(x, y)` whose cells differ, in row-major order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferDiff {
    changes: Vec<(u16, u16)>,
}

impl BufferDiff {
    /// Compare `new` against `old` inside `new`'s dirty union.
    ///
    /// Buffers of different sizes are treated as completely changed.
    pub fn compute(old: &ScreenBuffer, new: &ScreenBuffer) -> Self {
        if old.width() != new.width() || old.height() != new.height() {
            return Self::full(new);
        }
        let Some(area) = new.dirty_union() else {
            return Self::default();
        };
        let mut changes = Vec::new();
        for y in area.top()..area.bottom() {
            let old_row = old.row(y);
            let new_row = new.row(y);
            for x in area.left()..area.right() {
                let i = usize::from(x);
                if old_row[i] != new_row[i] {
                    changes.push((x, y));
                }
            }
        }
        Self { changes }
    }

    /// Every cell of `buffer`.
    pub fn full(buffer: &ScreenBuffer) -> Self {
        let changes = (0..buffer.height())
            .flat_map(|y| (0..buffer.width()).map(move |x| (x, y)))
            .collect();
        Self { changes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[(u16, u16)] {
        &self.changes
    }

    /// Coalesce horizontally adjacent changes into runs.
    pub fn runs(&self) -> Vec<ChangeRun> {
        let mut runs: Vec<ChangeRun> = Vec::new();
        for &(x, y) in &self.changes {
            match runs.last_mut() {
                Some(run) if run.y == y && run.x1 + 1 == x => run.x1 = x,
                _ => runs.push(ChangeRun::new(y, x, x)),
            }
        }
        runs
    }
}
