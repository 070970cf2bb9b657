#![forbid(unsafe_code)]

//! A focusable push button.

use std::fmt;

use weft_core::event::{Key, MouseEvent};
use weft_core::text_width::display_width;
use weft_layout::element::{Element, ElementState};
use weft_render::paint::PaintContext;
use weft_render::style::Style;

type PressFn = Box<dyn FnMut()>;

/// Renders as `[ label ]`. Activates on `enter`, `space` or a click.
pub struct Button {
    state: ElementState,
    label: String,
    style: Style,
    focus_style: Style,
    hover_style: Style,
    on_press: Option<PressFn>,
    presses: u32,
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("id", &self.state.id)
            .field("label", &self.label)
            .field("presses", &self.presses)
            .finish()
    }
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            state: ElementState::new().focusable(true),
            label: label.into(),
            style: Style::default(),
            focus_style: Style::new().reverse(),
            hover_style: Style::new().bold(),
            on_press: None,
            presses: 0,
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.state.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }

    #[must_use]
    pub fn hover_style(mut self, style: Style) -> Self {
        self.hover_style = style;
        self
    }

    #[must_use]
    pub fn on_press(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_press = Some(Box::new(callback));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Times the button was activated.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    pub fn press(&mut self) {
        self.presses += 1;
        if let Some(callback) = self.on_press.as_mut() {
            callback();
        }
    }

    fn face(&self) -> String {
        format!("[ {} ]", self.label)
    }

    fn current_style(&self) -> Style {
        let mut style = self.style;
        if self.state.hovered {
            style = style.patch(self.hover_style);
        }
        if self.state.focused {
            style = style.patch(self.focus_style);
        }
        style
    }
}

impl Element for Button {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn render(&self) -> String {
        self.face()
    }

    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        ctx.put_str(0, 0, &self.face(), self.current_style());
    }

    fn measure(&self, _max_width: Option<u16>) -> (u16, u16) {
        let width = display_width(&self.label) + 4;
        (u16::try_from(width).unwrap_or(u16::MAX), 1)
    }

    fn handle_key(&mut self, key: &Key) -> bool {
        if key.is("enter") || key.is("space") {
            self.press();
            return true;
        }
        false
    }

    fn handle_mouse(&mut self, event: &MouseEvent) -> bool {
        if event.is_click() {
            self.press();
            return true;
        }
        false
    }
}
