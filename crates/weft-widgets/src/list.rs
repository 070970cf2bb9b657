#![forbid(unsafe_code)]

//! Scrollable list with a single selection.
//!
//! The list scrolls on its own (it is [`Scrollable`]) and selects by row
//! ([`Selectable`]), so the session can route wheel events and clicks to it
//! without knowing its type. Keyboard navigation keeps the selection inside
//! the visible window. When bound, the selected item's text is stored under
//! the binding key.

use weft_core::event::Key;
use weft_core::geometry::Size;
use weft_core::text_width::display_width;
use weft_layout::element::{Bindable, Element, ElementState, Scrollable, Selectable, StateMap};
use weft_render::paint::PaintContext;
use weft_render::style::Style;

#[derive(Debug, Clone)]
pub struct List {
    state: ElementState,
    items: Vec<String>,
    selected: Option<usize>,
    /// First visible item.
    offset: usize,
    binding: Option<String>,
    style: Style,
    highlight_style: Style,
    highlight_symbol: String,
}

impl Default for List {
    fn default() -> Self {
        Self {
            state: ElementState::new().focusable(true),
            items: Vec::new(),
            selected: None,
            offset: 0,
            binding: None,
            style: Style::default(),
            highlight_style: Style::new().reverse(),
            highlight_symbol: "> ".to_string(),
        }
    }
}

impl List {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.state.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn height(mut self, height: Size) -> Self {
        self.state.height = height;
        self
    }

    #[must_use]
    pub fn width(mut self, width: Size) -> Self {
        self.state.width = width;
        self
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn highlight_style(mut self, style: Style) -> Self {
        self.highlight_style = style;
        self
    }

    #[must_use]
    pub fn highlight_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.highlight_symbol = symbol.into();
        self
    }

    #[must_use]
    pub fn selected_index(mut self, index: Option<usize>) -> Self {
        Selectable::select(&mut self, index);
        self
    }

    /// Store the selected item under `key`.
    #[must_use]
    pub fn bind(mut self, key: impl Into<String>) -> Self {
        self.binding = Some(key.into());
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows available for items: the laid-out height, or every item before
    /// layout.
    fn viewport(&self) -> usize {
        self.state
            .bounds
            .map_or(self.items.len(), |b| usize::from(b.height))
    }

    fn max_offset(&self) -> usize {
        self.items.len().saturating_sub(self.viewport().max(1))
    }

    fn ensure_visible(&mut self) {
        let Some(selected) = self.selected else {
            return;
        };
        let viewport = self.viewport().max(1);
        if selected < self.offset {
            self.offset = selected;
        } else if selected >= self.offset + viewport {
            self.offset = selected + 1 - viewport;
        }
    }

    fn move_selection(&mut self, target: usize) -> bool {
        if self.items.is_empty() {
            return false;
        }
        let target = target.min(self.items.len() - 1);
        let changed = Selectable::select(self, Some(target));
        self.ensure_visible();
        changed
    }
}

impl Element for List {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn render(&self) -> String {
        self.items.join("\n")
    }

    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        let pad = display_width(&self.highlight_symbol);
        let indent = " ".repeat(pad);
        let rows = usize::from(ctx.height());
        for (row, (index, item)) in self
            .items
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(rows)
            .enumerate()
        {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            let selected = self.selected == Some(index);
            let (marker, style) = if selected {
                (self.highlight_symbol.as_str(), self.style.patch(self.highlight_style))
            } else {
                (indent.as_str(), self.style)
            };
            let at = ctx.put_str(0, row, marker, style);
            ctx.put_str(at, row, item, style);
        }
    }

    fn measure(&self, _max_width: Option<u16>) -> (u16, u16) {
        let widest = self.items.iter().map(|i| display_width(i)).max().unwrap_or(0);
        let width = widest + display_width(&self.highlight_symbol);
        (
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(self.items.len()).unwrap_or(u16::MAX),
        )
    }

    fn handle_key(&mut self, key: &Key) -> bool {
        let current = self.selected;
        let page = self.viewport().max(1);
        match key.name.as_str() {
            "down" | "j" => self.move_selection(current.map_or(0, |i| i + 1)),
            "up" | "k" => self.move_selection(current.map_or(0, |i| i.saturating_sub(1))),
            "pagedown" => self.move_selection(current.map_or(0, |i| i + page)),
            "pageup" => self.move_selection(current.map_or(0, |i| i.saturating_sub(page))),
            "home" => self.move_selection(0),
            "end" => self.move_selection(usize::MAX),
            _ => false,
        }
    }

    fn as_scrollable_mut(&mut self) -> Option<&mut dyn Scrollable> {
        Some(self)
    }

    fn as_selectable_mut(&mut self) -> Option<&mut dyn Selectable> {
        Some(self)
    }

    fn as_bindable_mut(&mut self) -> Option<&mut dyn Bindable> {
        if self.binding.is_some() { Some(self) } else { None }
    }
}

impl Scrollable for List {
    fn scroll_offset(&self) -> u16 {
        u16::try_from(self.offset).unwrap_or(u16::MAX)
    }

    fn scroll_by(&mut self, delta: i32) -> bool {
        let max = i64::try_from(self.max_offset()).unwrap_or(i64::MAX);
        let offset = i64::try_from(self.offset).unwrap_or(i64::MAX);
        let next = (offset + i64::from(delta)).clamp(0, max);
        let next = usize::try_from(next).unwrap_or(0);
        let changed = next != self.offset;
        self.offset = next;
        changed
    }
}

impl Selectable for List {
    fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn select(&mut self, index: Option<usize>) -> bool {
        let index = index.filter(|&i| i < self.items.len());
        let changed = index != self.selected;
        self.selected = index;
        changed
    }

    fn select_at_row(&mut self, row: u16) -> bool {
        let index = self.offset + usize::from(row);
        if index >= self.items.len() {
            return false;
        }
        Selectable::select(self, Some(index))
    }
}

impl Bindable for List {
    fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    fn pull(&mut self, state: &StateMap) {
        let Some(key) = &self.binding else {
            return;
        };
        let wanted = state.get(key).and_then(|v| v.as_str());
        let index = wanted.and_then(|w| self.items.iter().position(|item| item == w));
        if index.is_some() {
            Selectable::select(self, index);
            self.ensure_visible();
        }
    }

    fn push(&self, state: &mut StateMap) -> bool {
        let (Some(key), Some(item)) = (&self.binding, self.selected_item()) else {
            return false;
        };
        let value = serde_json::Value::String(item.to_string());
        if state.get(key) == Some(&value) {
            return false;
        }
        state.insert(key.clone(), value);
        true
    }
}
