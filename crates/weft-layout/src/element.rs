#![forbid(unsafe_code)]

//! The widget contract.
//!
//! Every paintable or interactive node implements [`Element`]. Implementors
//! only have to expose their [`ElementState`] and paint themselves; focus,
//! hover and bounds bookkeeping have default implementations.
//!
//! Optional behaviors are separate traits ([`Scrollable`], [`Bindable`],
//! [`Selectable`]) that an element opts into by overriding the matching
//! `as_*_mut` query.
//!
//! Elements are shared as [`SharedElement`] handles: the layout tree, the
//! focus manager and the hover manager all hold clones of the same handle and
//! never copy the element itself.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use weft_core::event::{Key, MouseEvent};
use weft_core::geometry::{Bounds, Size};
use weft_core::text_width::{measure_lines, wrap_text};
use weft_render::paint::PaintContext;
use weft_render::style::Style;

/// Application state passed through to two-way bound widgets.
pub type StateMap = BTreeMap<String, serde_json::Value>;

/// Shared handle to an element in the live tree.
pub type SharedElement = Rc<RefCell<dyn Element>>;

/// Wrap an element in a shared handle.
pub fn shared<E: Element + 'static>(element: E) -> SharedElement {
    Rc::new(RefCell::new(element))
}

/// Whether two handles refer to the same element.
#[inline]
pub fn same_element(a: &SharedElement, b: &SharedElement) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Bookkeeping common to every element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementState {
    /// Unique within a focus cycle when set.
    pub id: Option<String>,
    pub focusable: bool,
    pub focused: bool,
    pub hovered: bool,
    /// Assigned by the layout engine each pass.
    pub bounds: Option<Bounds>,
    pub width: Size,
    pub height: Size,
}

impl ElementState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = focusable;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: Size) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: Size) -> Self {
        self.height = height;
        self
    }
}

/// A node that can be laid out, painted and interacted with.
pub trait Element {
    fn state(&self) -> &ElementState;
    fn state_mut(&mut self) -> &mut ElementState;

    fn id(&self) -> Option<&str> {
        self.state().id.as_deref()
    }

    fn is_focusable(&self) -> bool {
        self.state().focusable
    }

    fn is_focused(&self) -> bool {
        self.state().focused
    }

    fn is_hovered(&self) -> bool {
        self.state().hovered
    }

    fn bounds(&self) -> Option<Bounds> {
        self.state().bounds
    }

    fn set_bounds(&mut self, bounds: Bounds) {
        self.state_mut().bounds = Some(bounds);
    }

    fn width_spec(&self) -> Size {
        self.state().width
    }

    fn height_spec(&self) -> Size {
        self.state().height
    }

    /// Line-based content. Used by the default [`render_to`](Self::render_to)
    /// and [`measure`](Self::measure).
    fn render(&self) -> String {
        String::new()
    }

    /// Paint into an element-relative context.
    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        ctx.put_text(&self.render(), Style::default());
    }

    /// Content size as `(width, height)`.
    ///
    /// With `max_width` set, content is soft-wrapped to that width first.
    fn measure(&self, max_width: Option<u16>) -> (u16, u16) {
        let text = self.render();
        match max_width {
            Some(limit) => {
                let rows = wrap_text(&text, usize::from(limit));
                let width = rows
                    .iter()
                    .map(|row| weft_core::text_width::display_width(row))
                    .max()
                    .unwrap_or(0);
                (clamp_u16(width), clamp_u16(rows.len()))
            }
            None => {
                let (width, height) = measure_lines(&text);
                (clamp_u16(width), clamp_u16(height))
            }
        }
    }

    /// Returns whether the key was consumed.
    fn handle_key(&mut self, _key: &Key) -> bool {
        false
    }

    /// Returns whether the event was consumed.
    fn handle_mouse(&mut self, _event: &MouseEvent) -> bool {
        false
    }

    fn on_focus(&mut self) {
        self.state_mut().focused = true;
    }

    fn on_blur(&mut self) {
        self.state_mut().focused = false;
    }

    fn on_hover_enter(&mut self) {
        self.state_mut().hovered = true;
    }

    fn on_hover_exit(&mut self) {
        self.state_mut().hovered = false;
    }

    fn as_scrollable_mut(&mut self) -> Option<&mut dyn Scrollable> {
        None
    }

    fn as_bindable_mut(&mut self) -> Option<&mut dyn Bindable> {
        None
    }

    fn as_selectable_mut(&mut self) -> Option<&mut dyn Selectable> {
        None
    }
}

/// Vertically scrollable content.
pub trait Scrollable {
    /// Current offset in rows from the top of the content.
    fn scroll_offset(&self) -> u16;

    /// Move by `delta` rows, clamped to the content. Returns whether the
    /// offset changed.
    fn scroll_by(&mut self, delta: i32) -> bool;

    fn scroll_to(&mut self, offset: u16) -> bool {
        let delta = i32::from(offset) - i32::from(self.scroll_offset());
        self.scroll_by(delta)
    }
}

/// Two-way binding between a widget value and one state key.
pub trait Bindable {
    /// The state key this widget is bound to.
    fn binding(&self) -> Option<&str>;

    /// Load the bound value from `state`.
    fn pull(&mut self, state: &StateMap);

    /// Store the widget value into `state`. Returns whether the stored value
    /// changed.
    fn push(&self, state: &mut StateMap) -> bool;
}

/// A widget with a selectable row.
pub trait Selectable {
    fn selected(&self) -> Option<usize>;

    /// Returns whether the selection changed.
    fn select(&mut self, index: Option<usize>) -> bool;

    /// Select the item displayed at element-relative `row`.
    fn select_at_row(&mut self, row: u16) -> bool;
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label {
        state: ElementState,
        text: String,
    }

    impl Element for Label {
        fn state(&self) -> &ElementState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut ElementState {
            &mut self.state
        }
        fn render(&self) -> String {
            self.text.clone()
        }
    }

    fn label(text: &str) -> Label {
        Label {
            state: ElementState::new(),
            text: text.to_string(),
        }
    }

    #[test]
    fn measure_uses_rendered_lines() {
        assert_eq!(label("ab\nabcd").measure(None), (4, 2));
        assert_eq!(label("").measure(None), (0, 0));
    }

    #[test]
    fn measure_with_wrap_width() {
        assert_eq!(label("aaa bbb ccc").measure(Some(7)), (7, 2));
    }

    #[test]
    fn default_hooks_track_state() {
        let mut l = label("x");
        l.on_focus();
        l.on_hover_enter();
        assert!(l.is_focused() && l.is_hovered());
        l.on_blur();
        l.on_hover_exit();
        assert!(!l.is_focused() && !l.is_hovered());
    }

    #[test]
    fn shared_identity() {
        let a = shared(label("a"));
        let b = shared(label("a"));
        assert!(same_element(&a, &a.clone()));
        assert!(!same_element(&a, &b));
    }

    #[test]
    fn capabilities_default_to_none() {
        let mut l = label("x");
        assert!(l.as_scrollable_mut().is_none());
        assert!(l.as_bindable_mut().is_none());
        assert!(l.as_selectable_mut().is_none());
        assert!(!l.handle_key(&Key::character('a')));
    }
}
