#![forbid(unsafe_code)]

//! Bordered, optionally scrollable container.
//!
//! A frame stacks its children vertically inside its border and padding. When
//! the content is taller than the viewport and the frame is scrollable, the
//! children are shifted up by the scroll offset during painting and, if
//! enabled, one column on the right is reserved for a scrollbar.
//!
//! The layout engine owns the geometry: it calls
//! [`Frame::set_scroll_metrics`] after measuring the content so the offset can
//! be clamped.

use weft_core::event::{Key, MouseButton, MouseEvent, MouseEventKind};
use weft_core::geometry::{Bounds, Sides, Size};
use weft_core::text_width::truncate_to_width;
use weft_render::cell::Cell;
use weft_render::paint::PaintContext;
use weft_render::style::Style;

use crate::borders::{BorderType, Borders, scrollbar_glyphs};
use crate::element::{Element, ElementState, Scrollable};

/// Rows scrolled per mouse wheel notch.
const WHEEL_STEP: i32 = 3;

/// What happens to content wider than the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Overflow {
    /// Cut at the inner edge.
    #[default]
    Clip,
    /// Allowed to paint past the frame (still clipped to the screen).
    Visible,
    /// Children are measured and painted soft-wrapped at the inner width.
    Wrap,
}

/// Vertical scroll position and the extents it is clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollState {
    pub offset: u16,
    pub content_height: u16,
    pub viewport_height: u16,
}

impl ScrollState {
    pub fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn overflows(&self) -> bool {
        self.content_height > self.viewport_height
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}

/// A container element with a border, title, padding and scrolling.
#[derive(Debug, Clone)]
pub struct Frame {
    state: ElementState,
    border: BorderType,
    borders: Borders,
    title: Option<String>,
    padding: Sides,
    margin: Sides,
    spacing: u16,
    overflow_x: Overflow,
    scrollable: bool,
    scrollbar: bool,
    style: Style,
    border_style: Style,
    focus_border_style: Style,
    scroll: ScrollState,
    scrollbar_visible: bool,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// A plain bordered frame, full width, as tall as its content.
    pub fn new() -> Self {
        Self {
            state: ElementState::new().with_width(Size::Fill),
            border: BorderType::Plain,
            borders: Borders::ALL,
            title: None,
            padding: Sides::ZERO,
            margin: Sides::ZERO,
            spacing: 0,
            overflow_x: Overflow::Clip,
            scrollable: false,
            scrollbar: true,
            style: Style::default(),
            border_style: Style::default(),
            focus_border_style: Style::default().bold(),
            scroll: ScrollState::default(),
            scrollbar_visible: false,
        }
    }

    // --- Builders ---------------------------------------------------------

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.state.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn border(mut self, border: BorderType) -> Self {
        self.border = border;
        self
    }

    #[must_use]
    pub fn borders(mut self, borders: Borders) -> Self {
        self.borders = borders;
        self
    }

    #[must_use]
    pub fn width(mut self, width: Size) -> Self {
        self.state.width = width;
        self
    }

    #[must_use]
    pub fn height(mut self, height: Size) -> Self {
        self.state.height = height;
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub fn overflow_x(mut self, overflow: Overflow) -> Self {
        self.overflow_x = overflow;
        self
    }

    /// Scrollable frames are focusable so keys can scroll them.
    #[must_use]
    pub fn scrollable(mut self, scrollable: bool) -> Self {
        self.scrollable = scrollable;
        self.state.focusable = scrollable;
        self
    }

    #[must_use]
    pub fn scrollbar(mut self, scrollbar: bool) -> Self {
        self.scrollbar = scrollbar;
        self
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    #[must_use]
    pub fn focus_border_style(mut self, style: Style) -> Self {
        self.focus_border_style = style;
        self
    }

    // --- Accessors --------------------------------------------------------

    pub fn margin_sides(&self) -> Sides {
        self.margin
    }

    pub fn gap(&self) -> u16 {
        self.spacing
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow_x
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn wants_scrollbar(&self) -> bool {
        self.scrollable && self.scrollbar
    }

    pub fn has_border(&self) -> bool {
        self.border.is_visible() && !self.borders.is_empty()
    }

    /// Space taken by the border and padding on each side.
    pub fn chrome(&self) -> Sides {
        let edge = |side: Borders| u16::from(self.has_border() && self.borders.contains(side));
        Sides {
            top: edge(Borders::TOP) + self.padding.top,
            right: edge(Borders::RIGHT) + self.padding.right,
            bottom: edge(Borders::BOTTOM) + self.padding.bottom,
            left: edge(Borders::LEFT) + self.padding.left,
        }
    }

    /// Smallest outer size: 3×3 for a fully bordered frame.
    pub fn min_size(&self) -> (u16, u16) {
        if self.has_border() {
            let chrome = self.chrome();
            (chrome.horizontal_sum().max(3), chrome.vertical_sum().max(3))
        } else {
            (0, 0)
        }
    }

    /// Content area: bounds minus chrome and any visible scrollbar column.
    pub fn inner_bounds(&self) -> Option<Bounds> {
        let mut inner = self.state.bounds?.inner(self.chrome());
        if self.scrollbar_visible {
            inner.width = inner.width.saturating_sub(1);
        }
        Some(inner)
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    pub fn has_scrollbar(&self) -> bool {
        self.scrollbar_visible
    }

    /// Record content and viewport heights; clamps the offset.
    pub fn set_scroll_metrics(&mut self, content_height: u16, viewport_height: u16) {
        self.scroll.content_height = content_height;
        self.scroll.viewport_height = viewport_height;
        if self.scrollable {
            self.scroll.clamp();
        } else {
            self.scroll.offset = 0;
        }
    }

    /// Set the offset directly. It is clamped at the next layout pass.
    pub fn set_scroll_offset(&mut self, offset: u16) {
        self.scroll.offset = offset;
    }

    pub fn set_scrollbar_visible(&mut self, visible: bool) {
        self.scrollbar_visible = visible;
    }

    fn paint_border(&self, ctx: &mut PaintContext<'_>) {
        let Some(set) = self.border.to_border_set(ctx.unicode()) else {
            return;
        };
        if !self.has_border() {
            return;
        }
        let style = if self.state.focused {
            self.border_style.patch(self.focus_border_style)
        } else {
            self.border_style
        };
        let (w, h) = (ctx.width(), ctx.height());
        if w == 0 || h == 0 {
            return;
        }
        let cell = |ch: char| style.apply(Cell::new(ch));

        if self.borders.contains(Borders::LEFT) {
            ctx.fill_rect(0, 0, 1, h, cell(set.vertical));
        }
        if self.borders.contains(Borders::RIGHT) {
            ctx.fill_rect(w - 1, 0, 1, h, cell(set.vertical));
        }
        if self.borders.contains(Borders::TOP) {
            ctx.fill_rect(0, 0, w, 1, cell(set.horizontal));
        }
        if self.borders.contains(Borders::BOTTOM) {
            ctx.fill_rect(0, h - 1, w, 1, cell(set.horizontal));
        }
        if self.borders.contains(Borders::LEFT | Borders::TOP) {
            ctx.set(0, 0, cell(set.top_left));
        }
        if self.borders.contains(Borders::RIGHT | Borders::TOP) {
            ctx.set(w - 1, 0, cell(set.top_right));
        }
        if self.borders.contains(Borders::LEFT | Borders::BOTTOM) {
            ctx.set(0, h - 1, cell(set.bottom_left));
        }
        if self.borders.contains(Borders::RIGHT | Borders::BOTTOM) {
            ctx.set(w - 1, h - 1, cell(set.bottom_right));
        }

        if let Some(title) = self.title.as_deref()
            && self.borders.contains(Borders::TOP)
            && w > 4
        {
            let (visible, _) = truncate_to_width(title, usize::from(w - 4));
            ctx.put_str(2, 0, visible, style);
        }
    }

    fn paint_scrollbar(&self, ctx: &mut PaintContext<'_>) {
        if !self.scrollbar_visible {
            return;
        }
        let chrome = self.chrome();
        let track_h = ctx
            .height()
            .saturating_sub(chrome.top)
            .saturating_sub(chrome.bottom);
        if track_h == 0 {
            return;
        }
        let col = ctx
            .width()
            .saturating_sub(chrome.right)
            .saturating_sub(1);
        let (track, thumb) = scrollbar_glyphs(ctx.unicode());
        let (thumb_start, thumb_len) = thumb_geometry(&self.scroll, track_h);
        for row in 0..track_h {
            let in_thumb = row >= thumb_start && row < thumb_start + thumb_len;
            let ch = if in_thumb { thumb } else { track };
            ctx.set(col, chrome.top + row, self.border_style.apply(Cell::new(ch)));
        }
    }
}

/// Thumb `(start, length)` within a track of `track_h` rows.
fn thumb_geometry(scroll: &ScrollState, track_h: u16) -> (u16, u16) {
    let content = u32::from(scroll.content_height.max(1));
    let viewport = u32::from(scroll.viewport_height);
    let track = u32::from(track_h);
    let len = (track * viewport / content).clamp(1, track);
    let max_offset = u32::from(scroll.max_offset());
    let start = if max_offset == 0 {
        0
    } else {
        (track - len) * u32::from(scroll.offset) / max_offset
    };
    (start as u16, len as u16)
}

impl Element for Frame {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn measure(&self, _max_width: Option<u16>) -> (u16, u16) {
        self.min_size()
    }

    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        if !self.style.is_plain() {
            ctx.fill(self.style);
        }
        self.paint_border(ctx);
        self.paint_scrollbar(ctx);
    }

    fn handle_key(&mut self, key: &Key) -> bool {
        if !self.scrollable {
            return false;
        }
        let page = i32::from(self.scroll.viewport_height.max(1));
        match key.name.as_str() {
            "up" => self.scroll_by(-1),
            "down" => self.scroll_by(1),
            "pageup" => self.scroll_by(-page),
            "pagedown" => self.scroll_by(page),
            "home" => self.scroll_to(0),
            "end" => self.scroll_to(self.scroll.max_offset()),
            _ => false,
        }
    }

    fn handle_mouse(&mut self, event: &MouseEvent) -> bool {
        if !self.scrollable || event.kind != MouseEventKind::Scroll {
            return false;
        }
        match event.button {
            MouseButton::ScrollUp => self.scroll_by(-WHEEL_STEP),
            MouseButton::ScrollDown => self.scroll_by(WHEEL_STEP),
            _ => false,
        }
    }

    fn as_scrollable_mut(&mut self) -> Option<&mut dyn Scrollable> {
        if self.scrollable { Some(self) } else { None }
    }
}

impl Scrollable for Frame {
    fn scroll_offset(&self) -> u16 {
        self.scroll.offset
    }

    fn scroll_by(&mut self, delta: i32) -> bool {
        let max = i32::from(self.scroll.max_offset());
        let next = (i32::from(self.scroll.offset) + delta).clamp(0, max);
        let next = u16::try_from(next).unwrap_or(0);
        let changed = next != self.scroll.offset;
        self.scroll.offset = next;
        changed
    }
}
