#![forbid(unsafe_code)]

//! Cell-space geometry: rectangles, edge insets and size specifications.
//!
//! All coordinates are terminal cells with the origin at the top-left corner.
//! Arithmetic saturates at `u16` limits instead of wrapping, so a degenerate
//! rectangle collapses to zero extent rather than producing garbage.

use std::fmt;
use std::str::FromStr;

/// Absolute position and extent assigned to a layout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    /// Left column (inclusive).
    pub x: u16,
    /// Top row (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Bounds {
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds anchored at the origin.
    #[inline]
    pub const fn sized(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub const fn left(&self) -> u16 {
        self.x
    }

    #[inline]
    pub const fn top(&self) -> u16 {
        self.y
    }

    /// First column past the right edge.
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// First row past the bottom edge.
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the cell at `(x, y)` lies inside these bounds.
    #[inline]
    pub const fn contains_point(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether the two rectangles share at least one cell.
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.intersection(other).is_some()
    }

    /// The shared area of two rectangles, or `None` when they are disjoint.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (x < right && y < bottom).then(|| Bounds::new(x, y, right - x, bottom - y))
    }

    /// Smallest rectangle covering both inputs.
    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(x, y, right - x, bottom - y)
    }

    /// Shrink by the given insets. Oversized insets collapse the extent to zero.
    pub fn inner(&self, insets: Sides) -> Bounds {
        Bounds {
            x: self.x.saturating_add(insets.left),
            y: self.y.saturating_add(insets.top),
            width: self.width.saturating_sub(insets.horizontal_sum()),
            height: self.height.saturating_sub(insets.vertical_sum()),
        }
    }

    /// Grow by the given insets, clamping the origin at zero.
    pub fn outer(&self, insets: Sides) -> Bounds {
        Bounds {
            x: self.x.saturating_sub(insets.left),
            y: self.y.saturating_sub(insets.top),
            width: self.width.saturating_add(insets.horizontal_sum()),
            height: self.height.saturating_add(insets.vertical_sum()),
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.x, self.y, self.width, self.height)
    }
}

/// Per-edge insets used for padding and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    pub const ZERO: Sides = Sides::all(0);

    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same inset on every edge.
    pub const fn all(value: u16) -> Self {
        Self::new(value, value, value, value)
    }

    /// Left plus right.
    #[inline]
    pub const fn horizontal_sum(&self) -> u16 {
        self.left.saturating_add(self.right)
    }

    /// Top plus bottom.
    #[inline]
    pub const fn vertical_sum(&self) -> u16 {
        self.top.saturating_add(self.bottom)
    }
}

impl From<u16> for Sides {
    fn from(value: u16) -> Self {
        Sides::all(value)
    }
}

impl From<(u16, u16)> for Sides {
    fn from((vertical, horizontal): (u16, u16)) -> Self {
        Sides::new(vertical, horizontal, vertical, horizontal)
    }
}

/// How a node wants one of its extents sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Size {
    /// Exactly this many cells.
    Fixed(u16),
    /// A percentage of the available extent, rounded down.
    Percent(u16),
    /// An equal share of whatever the parent has left over.
    Fill,
    /// As large as the content needs.
    #[default]
    Auto,
}

impl Size {
    /// Resolve to a concrete extent.
    ///
    /// `available` is the space offered by the parent and `content` the
    /// measured preferred extent. `Fill` takes everything offered; callers
    /// that share remaining space between several fill children divide it
    /// themselves before resolving.
    pub fn resolve(self, available: u16, content: u16) -> u16 {
        match self {
            Size::Fixed(n) => n,
            Size::Percent(p) => percent_of(available, p),
            Size::Fill => available,
            Size::Auto => content,
        }
    }

    #[inline]
    pub const fn is_fill(self) -> bool {
        matches!(self, Size::Fill)
    }
}

fn percent_of(available: u16, percent: u16) -> u16 {
    let scaled = u32::from(available) * u32::from(percent) / 100;
    u16::try_from(scaled).unwrap_or(u16::MAX)
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Fixed(n) => write!(f, "{n}"),
            Size::Percent(p) => write!(f, "{p}%"),
            Size::Fill => f.write_str("fill"),
            Size::Auto => f.write_str("auto"),
        }
    }
}

/// A size specification string that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid size specification {input:?}")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for Size {
    type Err = SizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || SizeParseError {
            input: s.to_string(),
        };
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "auto" => return Ok(Size::Auto),
            "fill" | "*" => return Ok(Size::Fill),
            _ => {}
        }
        if let Some(digits) = trimmed.strip_suffix('%') {
            return digits.trim().parse().map(Size::Percent).map_err(|_| err());
        }
        trimmed.parse().map(Size::Fixed).map_err(|_| err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Bounds ---

    #[test]
    fn edges_and_area() {
        let b = Bounds::new(2, 3, 10, 4);
        assert_eq!(b.left(), 2);
        assert_eq!(b.top(), 3);
        assert_eq!(b.right(), 12);
        assert_eq!(b.bottom(), 7);
        assert_eq!(b.area(), 40);
        assert!(!b.is_empty());
    }

    #[test]
    fn right_and_bottom_saturate() {
        let b = Bounds::new(u16::MAX - 1, u16::MAX - 1, 10, 10);
        assert_eq!(b.right(), u16::MAX);
        assert_eq!(b.bottom(), u16::MAX);
    }

    #[test]
    fn contains_point_is_half_open() {
        let b = Bounds::new(1, 1, 3, 2);
        assert!(b.contains_point(1, 1));
        assert!(b.contains_point(3, 2));
        assert!(!b.contains_point(4, 1));
        assert!(!b.contains_point(1, 3));
        assert!(!b.contains_point(0, 1));
    }

    #[test]
    fn empty_bounds_contain_nothing() {
        let b = Bounds::new(5, 5, 0, 3);
        assert!(b.is_empty());
        assert!(!b.contains_point(5, 5));
    }

    #[test]
    fn overlaps_excludes_touching_edges() {
        let a = Bounds::new(0, 0, 5, 5);
        assert!(a.overlaps(&Bounds::new(4, 4, 2, 2)));
        assert!(!a.overlaps(&Bounds::new(5, 0, 2, 2)));
        assert!(!a.overlaps(&Bounds::new(0, 5, 2, 2)));
    }

    #[test]
    fn intersection_of_overlapping() {
        let a = Bounds::new(0, 0, 10, 10);
        let b = Bounds::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Bounds::new(5, 5, 5, 5)));
        assert_eq!(a.intersection(&Bounds::new(20, 20, 1, 1)), None);
    }

    #[test]
    fn union_covers_both() {
        let a = Bounds::new(1, 1, 2, 2);
        let b = Bounds::new(5, 4, 1, 3);
        assert_eq!(a.union(&b), Bounds::new(1, 1, 5, 6));
    }

    #[test]
    fn union_ignores_empty_side() {
        let a = Bounds::new(3, 3, 2, 2);
        assert_eq!(a.union(&Bounds::default()), a);
        assert_eq!(Bounds::default().union(&a), a);
    }

    #[test]
    fn inner_and_outer_are_inverse_when_room() {
        let b = Bounds::new(4, 4, 10, 6);
        let s = Sides::new(1, 2, 1, 2);
        assert_eq!(b.inner(s), Bounds::new(6, 5, 6, 4));
        assert_eq!(b.inner(s).outer(s), b);
    }

    #[test]
    fn inner_collapses_on_large_insets() {
        let b = Bounds::new(0, 0, 3, 3);
        let i = b.inner(Sides::all(5));
        assert_eq!(i.width, 0);
        assert_eq!(i.height, 0);
    }

    // --- Sides ---

    #[test]
    fn sides_sums_and_conversions() {
        let s = Sides::new(1, 2, 3, 4);
        assert_eq!(s.horizontal_sum(), 6);
        assert_eq!(s.vertical_sum(), 4);
        assert_eq!(Sides::from(2), Sides::all(2));
        assert_eq!(Sides::from((1, 3)), Sides::new(1, 3, 1, 3));
        assert_eq!(Sides::all(u16::MAX).horizontal_sum(), u16::MAX);
    }

    // --- Size ---

    #[test]
    fn resolve_each_variant() {
        assert_eq!(Size::Fixed(7).resolve(100, 3), 7);
        assert_eq!(Size::Percent(50).resolve(81, 3), 40);
        assert_eq!(Size::Fill.resolve(81, 3), 81);
        assert_eq!(Size::Auto.resolve(81, 3), 3);
    }

    #[test]
    fn percent_over_hundred_saturates() {
        assert_eq!(Size::Percent(1000).resolve(u16::MAX, 0), u16::MAX);
    }

    #[test]
    fn parse_size_specs() {
        assert_eq!("12".parse::<Size>(), Ok(Size::Fixed(12)));
        assert_eq!(" 25% ".parse::<Size>(), Ok(Size::Percent(25)));
        assert_eq!("fill".parse::<Size>(), Ok(Size::Fill));
        assert_eq!("*".parse::<Size>(), Ok(Size::Fill));
        assert_eq!("AUTO".parse::<Size>(), Ok(Size::Auto));
        assert_eq!("".parse::<Size>(), Ok(Size::Auto));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "wide".parse::<Size>().unwrap_err();
        assert_eq!(err.input(), "wide");
        assert!("-3".parse::<Size>().is_err());
        assert!("x%".parse::<Size>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for size in [Size::Fixed(4), Size::Percent(30), Size::Fill, Size::Auto] {
            assert_eq!(size.to_string().parse::<Size>(), Ok(size));
        }
    }
}
