#![forbid(unsafe_code)]

//! Static multi-line text.

use weft_core::geometry::Size;
use weft_core::text_width::wrap_line;
use weft_layout::element::{Element, ElementState};
use weft_render::paint::PaintContext;
use weft_render::style::Style;

/// A label of one or more lines.
///
/// Lines longer than the assigned width are truncated, or soft-wrapped when
/// [`wrap`](Self::wrap) is set.
#[derive(Debug, Clone, Default)]
pub struct Text {
    state: ElementState,
    content: String,
    style: Style,
    wrap: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
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
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
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

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

impl Element for Text {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }

    fn render(&self) -> String {
        self.content.clone()
    }

    fn render_to(&self, ctx: &mut PaintContext<'_>) {
        if !self.wrap || ctx.wrap() {
            ctx.put_text(&self.content, self.style);
            return;
        }
        let width = usize::from(ctx.width());
        let mut row: u16 = 0;
        for line in self.content.lines() {
            for piece in wrap_line(line, width) {
                ctx.put_str(0, row, &piece, self.style);
                row = row.saturating_add(1);
            }
        }
    }

    fn measure(&self, max_width: Option<u16>) -> (u16, u16) {
        let (width, height) = weft_core::text_width::measure_lines(&self.content);
        let natural = (clamp(width), clamp(height));
        match max_width {
            Some(limit) if self.wrap || usize::from(limit) < width => {
                let rows: usize = self
                    .content
                    .lines()
                    .map(|line| wrap_line(line, usize::from(limit)).len())
                    .sum();
                (natural.0.min(limit), clamp(rows))
            }
            _ => natural,
        }
    }
}

fn clamp(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
