#![forbid(unsafe_code)]

//! Core: geometry, input decoding, click synthesis and terminal capabilities.

pub mod capabilities;
pub mod click;
pub mod event;
pub mod geometry;
pub mod input_parser;
pub mod keys;
pub mod text_width;

pub use capabilities::TerminalCapabilities;
pub use event::{Event, Key, KeyType, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use geometry::{Bounds, Sides, Size};
