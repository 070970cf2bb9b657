#![forbid(unsafe_code)]

//! Render: cells, styles, the screen buffer, and the diffing ANSI renderer.
//!
//! A frame is painted into a [`ScreenBuffer`](buffer::ScreenBuffer) through
//! [`PaintContext`](paint::PaintContext)s, then
//! [`DiffRenderer`](renderer::DiffRenderer) compares it with the previous
//! frame and produces the bytes that bring the terminal up to date.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod diff;
pub mod paint;
pub mod renderer;
pub mod style;

pub use buffer::ScreenBuffer;
pub use cell::{Cell, StyleFlags};
pub use color::{Color, ColorDepth};
pub use paint::PaintContext;
pub use renderer::{DiffRenderer, RenderMode, RenderStats};
pub use style::Style;
