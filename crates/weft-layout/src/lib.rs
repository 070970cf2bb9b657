#![forbid(unsafe_code)]

//! Layout: the element contract, the layout tree and its two-pass engine.
//!
//! # Components
//!
//! - [`Element`]: the trait every widget implements, plus the optional
//!   [`Scrollable`], [`Bindable`] and [`Selectable`] capabilities
//! - [`LayoutTree`]: an arena of stacks, frames and leaf elements
//! - [`layout`]: constraint calculation then bounds assignment
//! - [`Frame`]: bordered, scrollable container
//! - [`paint`]: walks a laid-out tree into a screen buffer
//!
//! # Example
//!
//! ```ignore
//! let mut tree = LayoutTree::new(NodeSpec::vstack(
//!     StackProps::new().width(Size::Fill),
//!     vec![NodeSpec::frame(Frame::new().title("Log"), vec![])],
//! ));
//! let elements = layout(&mut tree, 80, 24);
//! let report = paint(&tree, &mut buffer, caps);
//! ```

pub mod borders;
pub mod element;
pub mod engine;
pub mod frame;
pub mod painter;
pub mod tree;

pub use borders::{BorderType, Borders};
pub use element::{
    Bindable, Element, ElementState, Scrollable, Selectable, SharedElement, StateMap,
    same_element, shared,
};
pub use engine::{SizeConstraints, assign_bounds, calculate_constraints, layout};
pub use frame::{Frame, Overflow, ScrollState};
pub use painter::{PaintReport, RenderFailure, paint};
pub use tree::{HAlign, LayoutNode, LayoutTree, NodeId, NodeSpec, StackProps, VAlign};
