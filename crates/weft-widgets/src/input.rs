#![forbid(unsafe_code)]

//! Single-line text input.
//!
//! Cursor positions are grapheme indices, so a base character and its
//! combining marks move and delete as one unit. The visible window scrolls
//! horizontally to keep the cursor on screen.
//!
//! With a binding set, the input is two-way bound to one state key: the
//! session pulls the value before every layout and pushes it back after
//! each edit.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;
use weft_core::event::{Key, KeyType};
use weft_core::geometry::Size;
use weft_layout::element::{Bindable, Element, ElementState, StateMap};
use weft_render::cell::Cell;
use weft_render::paint::PaintContext;
use weft_render::style::Style;

#[derive(Debug, Clone)]
pub struct TextInput {
    state: ElementState,
    value: String,
    /// Grapheme index.
    cursor: usize,
    placeholder: String,
    binding: Option<String>,
    mask: Option<char>,
    max_length: Option<usize>,
    style: Style,
    cursor_style: Style,
    placeholder_style: Style,
}

impl Default for TextInput {
    fn default() -> Self {
        Self {
            state: ElementState::new().focusable(true).with_width(Size::Fill),
            value: String::new(),
            cursor: 0,
            placeholder: String::new(),
            binding: None,
            mask: None,
            max_length: None,
            style: Style::default(),
            cursor_style: Style::new().reverse(),
            placeholder_style: Style::new().dim(),
        }
    }
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builders ---

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.state.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.cursor = self.grapheme_count();
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Two-way bind to `key` in the application state.
    #[must_use]
    pub fn bind(mut self, key: impl Into<String>) -> Self {
        self.binding = Some(key.into());
        self
    }

    /// Password mode.
    #[must_use]
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Maximum length in graphemes.
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: Size) -> Self {
        self.state.width = width;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    // --- Value access ---

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the value, clamping the cursor.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.cursor.min(self.grapheme_count());
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // --- Editing ---

    fn grapheme_count(&self) -> usize {
        self.value.graphemes(true).count()
    }

    fn byte_offset(&self, grapheme: usize) -> usize {
        self.value
            .grapheme_indices(true)
            .nth(grapheme)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) -> bool {
        if self
            .max_length
            .is_some_and(|max| self.grapheme_count() >= max)
        {
            return false;
        }
        let before = self.grapheme_count();
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        // A combining mark merges into the previous grapheme.
        if self.grapheme_count() > before {
            self.cursor += 1;
        }
        true
    }

    fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.byte_offset(self.cursor - 1);
        let end = self.byte_offset(self.cursor);
        self.value.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.grapheme_count() {
            return false;
        }
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.value.replace_range(start..end, "");
        true
    }

    fn move_to(&mut self, cursor: usize) -> bool {
        let cursor = cursor.min(self.grapheme_count());
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }

    // --- Rendering ---

    fn display_graphemes(&self) -> Vec<String> {
        match self.mask {
            Some(mask) => (0..self.grapheme_count()).map(|_| mask.to_string()).collect(),
            None => self.value.graphemes(true).map(str::to_string).collect(),
        }
    }

    /// First grapheme shown so the cursor fits in `width` columns.
    fn scroll_start(graphemes: &[String], cursor: usize, width: usize) -> usize {
        if width == 0 {
            return cursor;
        }
        // Leave one column for the cursor cell.
        let mut used = 1;
        let mut start = cursor.min(graphemes.len());
        while start > 0 {
            let w = graphemes[start - 1].width();
            if used + w > width {
                break;
            }
            used += w;
            start -= 1;
        }
        start
    }
}

impl Element for TextInput {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn render(&self) -> String {
        if self.value.is_empty() {
            self.placeholder.clone()
        } else {
            self.display_graphemes().concat()
        }
    }

    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        let width = ctx.width();
        if self.value.is_empty() {
            ctx.put_str(0, 0, &self.placeholder, self.placeholder_style);
        } else {
            let graphemes = self.display_graphemes();
            let start = Self::scroll_start(&graphemes, self.cursor, usize::from(width));
            let visible = graphemes[start..].concat();
            ctx.put_str(0, 0, &visible, self.style);
        }
        if self.state.focused {
            let graphemes = self.display_graphemes();
            let start = Self::scroll_start(&graphemes, self.cursor, usize::from(width));
            let col: usize = graphemes[start..self.cursor.min(graphemes.len())]
                .iter()
                .map(|g| g.width())
                .sum();
            let under = graphemes
                .get(self.cursor)
                .and_then(|g| g.chars().next())
                .unwrap_or(' ');
            let col = u16::try_from(col).unwrap_or(u16::MAX);
            ctx.set(col, 0, self.cursor_style.apply(self.style.apply(Cell::new(under))));
        }
    }

    fn measure(&self, _max_width: Option<u16>) -> (u16, u16) {
        let text = self.render();
        let width = text.width() + 1;
        (u16::try_from(width).unwrap_or(u16::MAX), 1)
    }

    fn handle_key(&mut self, key: &Key) -> bool {
        if key.key_type == KeyType::Character
            && key.modifiers().is_empty()
            && let Some(c) = key.ch
        {
            return self.insert_char(c);
        }
        match key.name.as_str() {
            "backspace" => self.delete_back(),
            "delete" => self.delete_forward(),
            "left" => self.move_to(self.cursor.saturating_sub(1)),
            "right" => self.move_to(self.cursor + 1),
            "home" | "ctrl+a" => self.move_to(0),
            "end" | "ctrl+e" => self.move_to(usize::MAX),
            "ctrl+u" => {
                let changed = !self.value.is_empty();
                self.clear();
                changed
            }
            _ => false,
        }
    }

    fn as_bindable_mut(&mut self) -> Option<&mut dyn Bindable> {
        if self.binding.is_some() { Some(self) } else { None }
    }
}

impl Bindable for TextInput {
    fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    fn pull(&mut self, state: &StateMap) {
        let Some(key) = &self.binding else {
            return;
        };
        let value = match state.get(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if value != self.value {
            self.value = value;
            self.cursor = self.grapheme_count();
        }
    }

    fn push(&self, state: &mut StateMap) -> bool {
        let Some(key) = &self.binding else {
            return false;
        };
        let value = serde_json::Value::String(self.value.clone());
        if state.get(key) == Some(&value) {
            return false;
        }
        state.insert(key.clone(), value);
        true
    }
}
