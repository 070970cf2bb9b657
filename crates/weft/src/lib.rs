#![forbid(unsafe_code)]

//! Weft public facade crate.
//!
//! Re-exports the common types of the internal crates and offers a prelude
//! for building views:
//!
//! ```ignore
//! use weft::prelude::*;
//!
//! struct Hello;
//!
//! impl View for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn build(&self, _state: &StateMap) -> NodeSpec {
//!         NodeSpec::vstack(
//!             StackProps::new(),
//!             vec![NodeSpec::element(Text::new("hi")), NodeSpec::element(Button::new("OK"))],
//!         )
//!     }
//! }
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use weft_core::click::{ClickConfig, ClickSynthesizer};
pub use weft_core::input_parser::InputParser;
pub use weft_core::{
    Bounds, Event, Key, KeyType, Modifiers, MouseButton, MouseEvent, MouseEventKind, Sides, Size,
    TerminalCapabilities,
};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::{
    Cell, Color, ColorDepth, DiffRenderer, PaintContext, RenderMode, RenderStats, ScreenBuffer,
    Style, StyleFlags,
};

// --- Layout re-exports -----------------------------------------------------

pub use weft_layout::element::{Bindable, Element, ElementState, Scrollable, Selectable, StateMap};
pub use weft_layout::{
    BorderType, Borders, Frame, HAlign, LayoutTree, NodeSpec, Overflow, StackProps, VAlign,
};

// --- Widget re-exports -----------------------------------------------------

pub use weft_widgets::{Button, List, Text, TextInput};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use weft_runtime::{
    DispatchEvent, EventType, FocusManager, Handler, HandlerError, HandlerRegistry, HandlerResult,
    HoverManager, LogConfig, LogFormat, LogTarget, Payload, QuitHandle, RuntimeConfig, Scope,
    Session, SessionError, View, init_logging,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for weft apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// The interaction loop failed.
    #[cfg(feature = "runtime")]
    Session(SessionError),
    /// The log subscriber could not be installed.
    #[cfg(feature = "runtime")]
    Logging(weft_runtime::LoggingError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Session(err) => write!(f, "{err}"),
            #[cfg(feature = "runtime")]
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Session(err) => Some(err),
            #[cfg(feature = "runtime")]
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(feature = "runtime")]
impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

#[cfg(feature = "runtime")]
impl From<weft_runtime::LoggingError> for Error {
    fn from(err: weft_runtime::LoggingError) -> Self {
        Self::Logging(err)
    }
}

/// Standard result type for weft APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Bounds, Button, Element, ElementState, Error, Event, Frame, Key, List, NodeSpec, Result,
        Size, StackProps, StateMap, Style, Text, TextInput,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{Handler, RuntimeConfig, Session, View};

    pub use crate::{core, layout, render, widgets};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use weft_core as core;
pub use weft_layout as layout;
pub use weft_render as render;
#[cfg(feature = "runtime")]
pub use weft_runtime as runtime;
pub use weft_widgets as widgets;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::other("gone").into();
        assert_eq!(err.to_string(), "gone");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn prelude_builds_a_session() {
        struct Hello;

        impl View for Hello {
            fn name(&self) -> &str {
                "hello"
            }

            fn build(&self, _state: &StateMap) -> NodeSpec {
                NodeSpec::vstack(
                    StackProps::new(),
                    vec![
                        NodeSpec::element(Text::new("hi")),
                        NodeSpec::element(Button::new("OK").id("ok")),
                    ],
                )
            }
        }

        let mut session = Session::new(RuntimeConfig::default()).expect("session");
        session.register_view(Hello);
        session.render(10, 2);
        assert_eq!(session.focus().current_id().as_deref(), Some("ok"));
        assert_eq!(
            session.screen().map(|s| s.row_text(0)).unwrap_or_default(),
            "hi        "
        );
    }
}
