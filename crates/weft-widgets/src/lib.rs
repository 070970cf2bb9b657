#![forbid(unsafe_code)]

//! Leaf widgets for weft.
//!
//! Each widget implements [`Element`](weft_layout::Element) and opts into the
//! capabilities it supports:
//!
//! | Widget | Focusable | Capabilities |
//! |---|---|---|
//! | [`Text`] | no | |
//! | [`Button`] | yes | |
//! | [`TextInput`] | yes | `Bindable` when bound |
//! | [`List`] | yes | `Selectable`, `Scrollable`, `Bindable` when bound |

pub mod button;
pub mod input;
pub mod list;
pub mod text;

pub use button::Button;
pub use input::TextInput;
pub use list::List;
pub use text::Text;
