#![forbid(unsafe_code)]

//! Widgets laid out and painted inside a bordered frame.

use weft_core::TerminalCapabilities;
use weft_core::geometry::Size;
use weft_layout::{Element, Frame, LayoutTree, NodeSpec, StackProps, layout, paint};
use weft_render::buffer::ScreenBuffer;
use weft_widgets::{Button, List, Text};

fn paint_tree(spec: NodeSpec, width: u16, height: u16) -> (LayoutTree, ScreenBuffer) {
    let mut tree = LayoutTree::new(spec);
    layout(&mut tree, width, height);
    let mut buffer = ScreenBuffer::new(width, height);
    let report = paint(&tree, &mut buffer, TerminalCapabilities::basic());
    assert!(report.failures.is_empty());
    (tree, buffer)
}

#[test]
fn framed_form_paints_inside_border() {
    let form = NodeSpec::frame(
        Frame::new().title("Form"),
        vec![
            NodeSpec::element(Text::new("Name")),
            NodeSpec::element(Button::new("OK").id("ok")),
        ],
    );
    let (tree, buffer) = paint_tree(form, 12, 4);

    assert!(buffer.row_text(0).starts_with("+-Form"));
    assert!(buffer.row_text(1).starts_with("|Name"));
    assert!(buffer.row_text(2).starts_with("|[ OK ]"));
    assert!(buffer.row_text(3).starts_with("+---"));

    let focusable: Vec<_> = tree
        .elements()
        .into_iter()
        .filter(|e| e.borrow().is_focusable())
        .collect();
    // The button; the frame is not scrollable.
    assert_eq!(focusable.len(), 1);
}

#[test]
fn side_by_side_lists_split_the_row() {
    let row = NodeSpec::hstack(
        StackProps::new().spacing(1),
        vec![
            NodeSpec::element(List::new(["a", "b"]).width(Size::Fixed(5))),
            NodeSpec::element(List::new(["c", "d"]).width(Size::Fixed(5))),
        ],
    );
    let (_, buffer) = paint_tree(row, 11, 2);
    assert_eq!(buffer.to_text(), "  a     c  \n  b     d  ");
}
