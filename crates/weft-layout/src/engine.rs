#![forbid(unsafe_code)]

//! Two-pass layout.
//!
//! 1. [`calculate_constraints`] walks bottom-up. Leaves measure their content,
//!    containers combine their children's preferred sizes with spacing,
//!    padding and margin.
//! 2. [`assign_bounds`] walks top-down, handing each child a slot along the
//!    parent's main axis and aligning it on the cross axis.
//!
//! Slots include the node's margin; the bounds stored on a node exclude it.
//!
//! # Fill distribution
//!
//! Fixed, percentage and auto children are sized first. What is left after
//! them and the spacing is split between `Fill` children by floor division;
//! the remainder stays unused at the end of the axis.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, debug_span, trace};
use weft_core::geometry::{Bounds, Sides, Size};

use crate::element::{Element, SharedElement};
use crate::frame::{Frame, Overflow};
use crate::tree::{HAlign, LayoutNode, LayoutTree, NodeId, VAlign};

/// Output of the bottom-up pass, margins included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeConstraints {
    pub min_width: u16,
    pub min_height: u16,
    pub preferred_width: u16,
    pub preferred_height: u16,
}

impl SizeConstraints {
    /// Minimum and preferred both set to the given size.
    #[inline]
    pub const fn exact(width: u16, height: u16) -> Self {
        Self {
            min_width: width,
            min_height: height,
            preferred_width: width,
            preferred_height: height,
        }
    }

    /// Preferred size at least as large as the minimum.
    #[inline]
    pub fn normalized(self) -> Self {
        Self {
            preferred_width: self.preferred_width.max(self.min_width),
            preferred_height: self.preferred_height.max(self.min_height),
            ..self
        }
    }

    fn grow(self, sides: Sides) -> Self {
        let (h, v) = (sides.horizontal_sum(), sides.vertical_sum());
        Self {
            min_width: self.min_width.saturating_add(h),
            min_height: self.min_height.saturating_add(v),
            preferred_width: self.preferred_width.saturating_add(h),
            preferred_height: self.preferred_height.saturating_add(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    /// `(main, cross)` from a width/height pair.
    fn split<T>(self, width: T, height: T) -> (T, T) {
        match self {
            Axis::Vertical => (height, width),
            Axis::Horizontal => (width, height),
        }
    }

    fn rect(self, area: Bounds, main_pos: u16, main: u16, cross_pos: u16, cross: u16) -> Bounds {
        match self {
            Axis::Vertical => Bounds::new(
                area.x.saturating_add(cross_pos),
                area.y.saturating_add(main_pos),
                cross,
                main,
            ),
            Axis::Horizontal => Bounds::new(
                area.x.saturating_add(main_pos),
                area.y.saturating_add(cross_pos),
                main,
                cross,
            ),
        }
    }
}

/// Cross-axis placement, shared by both stack directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Start,
    Center,
    End,
    Stretch,
}

impl From<HAlign> for Align {
    fn from(align: HAlign) -> Self {
        match align {
            HAlign::Left => Align::Start,
            HAlign::Center => Align::Center,
            HAlign::Right => Align::End,
            HAlign::Stretch => Align::Stretch,
        }
    }
}

impl From<VAlign> for Align {
    fn from(align: VAlign) -> Self {
        match align {
            VAlign::Top => Align::Start,
            VAlign::Middle => Align::Center,
            VAlign::Bottom => Align::End,
            VAlign::Stretch => Align::Stretch,
        }
    }
}

/// How a container lays out its children.
#[derive(Debug, Clone, Copy)]
struct Flow {
    axis: Axis,
    spacing: u16,
    align: Align,
    /// Cap auto-sized children at the cross extent.
    clamp_cross: bool,
}

/// A node's own size specs and margin.
#[derive(Debug, Clone, Copy, Default)]
struct Sizing {
    width: Size,
    height: Size,
    margin: Sides,
}

fn sizing_of(tree: &LayoutTree, id: NodeId) -> Sizing {
    let Some(entry) = tree.get(id) else {
        return Sizing::default();
    };
    match &entry.node {
        LayoutNode::Element(element) => {
            let element = element.borrow();
            Sizing {
                width: element.width_spec(),
                height: element.height_spec(),
                margin: Sides::ZERO,
            }
        }
        LayoutNode::VStack(props) | LayoutNode::HStack(props) => Sizing {
            width: props.width,
            height: props.height,
            margin: props.margin,
        },
        LayoutNode::Frame(frame) => {
            let frame = frame.borrow();
            Sizing {
                width: frame.width_spec(),
                height: frame.height_spec(),
                margin: frame.margin_sides(),
            }
        }
    }
}

fn constraints_of(tree: &LayoutTree, id: NodeId) -> SizeConstraints {
    tree.get(id).map(|entry| entry.constraints).unwrap_or_default()
}

/// A fixed spec overrides the measured extent.
fn fixed_or(spec: Size, measured: u16) -> u16 {
    match spec {
        Size::Fixed(n) => n,
        _ => measured,
    }
}

/// Children stacked along `axis` with `spacing` between them.
fn stacked(children: &[SizeConstraints], axis: Axis, spacing: u16) -> SizeConstraints {
    let gaps = u16::try_from(children.len().saturating_sub(1))
        .unwrap_or(u16::MAX)
        .saturating_mul(spacing);
    let mut out = SizeConstraints::default();
    for c in children {
        match axis {
            Axis::Vertical => {
                out.min_width = out.min_width.max(c.min_width);
                out.preferred_width = out.preferred_width.max(c.preferred_width);
                out.min_height = out.min_height.saturating_add(c.min_height);
                out.preferred_height = out.preferred_height.saturating_add(c.preferred_height);
            }
            Axis::Horizontal => {
                out.min_height = out.min_height.max(c.min_height);
                out.preferred_height = out.preferred_height.max(c.preferred_height);
                out.min_width = out.min_width.saturating_add(c.min_width);
                out.preferred_width = out.preferred_width.saturating_add(c.preferred_width);
            }
        }
    }
    if !children.is_empty() {
        match axis {
            Axis::Vertical => {
                out.min_height = out.min_height.saturating_add(gaps);
                out.preferred_height = out.preferred_height.saturating_add(gaps);
            }
            Axis::Horizontal => {
                out.min_width = out.min_width.saturating_add(gaps);
                out.preferred_width = out.preferred_width.saturating_add(gaps);
            }
        }
    }
    out
}

/// Apply a container's chrome, fixed specs and margin to its content size.
fn finish(
    content: SizeConstraints,
    chrome: Sides,
    sizing: Sizing,
    floor: (u16, u16),
) -> SizeConstraints {
    let mut own = content.grow(chrome);
    own.min_width = own.min_width.max(floor.0);
    own.min_height = own.min_height.max(floor.1);
    if let Size::Fixed(n) = sizing.width {
        own.min_width = n;
        own.preferred_width = n;
    }
    if let Size::Fixed(n) = sizing.height {
        own.min_height = n;
        own.preferred_height = n;
    }
    own.normalized().grow(sizing.margin)
}

/// A node's variant with the data the passes need, detached from the tree
/// so children can be visited mutably.
enum Shape {
    Leaf(SharedElement),
    Stack {
        axis: Axis,
        spacing: u16,
        padding: Sides,
        align: Align,
    },
    Frame(Rc<RefCell<Frame>>),
}

fn shape_of(tree: &LayoutTree, id: NodeId) -> Option<(Shape, Vec<NodeId>)> {
    let entry = tree.get(id)?;
    let shape = match &entry.node {
        LayoutNode::Element(element) => Shape::Leaf(element.clone()),
        LayoutNode::VStack(props) => Shape::Stack {
            axis: Axis::Vertical,
            spacing: props.spacing,
            padding: props.padding,
            align: props.align.into(),
        },
        LayoutNode::HStack(props) => Shape::Stack {
            axis: Axis::Horizontal,
            spacing: props.spacing,
            padding: props.padding,
            align: props.valign.into(),
        },
        LayoutNode::Frame(frame) => Shape::Frame(frame.clone()),
    };
    Some((shape, entry.children.clone()))
}

/// Bottom-up pass for the subtree at `id`.
///
/// With `wrap_width` set, leaves are measured soft-wrapped to that width.
/// The result is stored on each node and returned for `id`.
pub fn calculate_constraints(
    tree: &mut LayoutTree,
    id: NodeId,
    wrap_width: Option<u16>,
) -> SizeConstraints {
    let Some((shape, children)) = shape_of(tree, id) else {
        return SizeConstraints::default();
    };
    let sizing = sizing_of(tree, id);

    let constraints = match shape {
        Shape::Leaf(element) => {
            let (w, h) = element.borrow().measure(wrap_width);
            SizeConstraints {
                min_width: fixed_or(sizing.width, 0),
                min_height: fixed_or(sizing.height, 0),
                preferred_width: fixed_or(sizing.width, w),
                preferred_height: fixed_or(sizing.height, h),
            }
        }
        Shape::Stack {
            axis,
            spacing,
            padding,
            ..
        } => {
            let inner_wrap = wrap_width.map(|w| w.saturating_sub(padding.horizontal_sum()));
            let measured: Vec<_> = children
                .iter()
                .map(|&child| calculate_constraints(tree, child, inner_wrap))
                .collect();
            finish(stacked(&measured, axis, spacing), padding, sizing, (0, 0))
        }
        Shape::Frame(frame) => {
            let (chrome, gap, floor, overflow) = {
                let frame = frame.borrow();
                (frame.chrome(), frame.gap(), frame.min_size(), frame.overflow())
            };
            let inner_wrap = match (overflow, sizing.width, wrap_width) {
                (Overflow::Wrap, Size::Fixed(n), _) => {
                    Some(n.saturating_sub(chrome.horizontal_sum()))
                }
                (_, _, Some(w)) => Some(w.saturating_sub(chrome.horizontal_sum())),
                _ => None,
            };
            let measured: Vec<_> = children
                .iter()
                .map(|&child| calculate_constraints(tree, child, inner_wrap))
                .collect();
            finish(stacked(&measured, Axis::Vertical, gap), chrome, sizing, floor)
        }
    };

    if let Some(entry) = tree.get_mut(id) {
        entry.constraints = constraints;
    }
    trace!(node = id.index(), ?constraints, "constraints");
    constraints
}

/// Top-down pass: place the subtree at `id` in `slot` (margin included).
pub fn assign_bounds(tree: &mut LayoutTree, id: NodeId, slot: Bounds) {
    let Some((shape, children)) = shape_of(tree, id) else {
        return;
    };
    let sizing = sizing_of(tree, id);
    let mut bounds = slot.inner(sizing.margin);

    match shape {
        Shape::Leaf(element) => {
            element.borrow_mut().set_bounds(bounds);
        }
        Shape::Stack {
            axis,
            spacing,
            padding,
            align,
        } => {
            let flow = Flow {
                axis,
                spacing,
                align,
                clamp_cross: true,
            };
            place_children(tree, &children, bounds.inner(padding), flow);
        }
        Shape::Frame(frame) => {
            bounds = layout_frame(tree, &frame, &children, bounds);
        }
    }

    if let Some(entry) = tree.get_mut(id) {
        entry.bounds = Some(bounds);
    }
}

fn layout_frame(
    tree: &mut LayoutTree,
    frame: &Rc<RefCell<Frame>>,
    children: &[NodeId],
    assigned: Bounds,
) -> Bounds {
    let (bounds, inner, gap, overflow, wants_scrollbar) = {
        let mut f = frame.borrow_mut();
        let (min_w, min_h) = f.min_size();
        let bounds = Bounds::new(
            assigned.x,
            assigned.y,
            assigned.width.max(min_w),
            assigned.height.max(min_h),
        );
        f.set_bounds(bounds);
        f.set_scrollbar_visible(false);
        (
            bounds,
            bounds.inner(f.chrome()),
            f.gap(),
            f.overflow(),
            f.wants_scrollbar(),
        )
    };

    let remeasure = |tree: &mut LayoutTree, width: u16| {
        for &child in children {
            calculate_constraints(tree, child, Some(width));
        }
    };
    if overflow == Overflow::Wrap {
        remeasure(tree, inner.width);
    }

    let content: Vec<_> = children.iter().map(|&c| constraints_of(tree, c)).collect();
    let content_height = stacked(&content, Axis::Vertical, gap).preferred_height;
    if wants_scrollbar && content_height > inner.height && inner.width > 0 {
        frame.borrow_mut().set_scrollbar_visible(true);
        if overflow == Overflow::Wrap {
            remeasure(tree, inner.width - 1);
        }
    }

    let area = frame.borrow().inner_bounds().unwrap_or(inner);
    let flow = Flow {
        axis: Axis::Vertical,
        spacing: gap,
        align: Align::Start,
        clamp_cross: overflow != Overflow::Visible,
    };
    let used = place_children(tree, children, area, flow);
    frame.borrow_mut().set_scroll_metrics(used, area.height);
    bounds
}

/// Distribute `area` between `children` along the flow axis.
///
/// Returns the main-axis extent used, spacing included.
fn place_children(tree: &mut LayoutTree, children: &[NodeId], area: Bounds, flow: Flow) -> u16 {
    if children.is_empty() {
        return 0;
    }
    let (main_avail, cross_avail) = flow.axis.split(area.width, area.height);
    let count = u16::try_from(children.len()).unwrap_or(u16::MAX);
    let spacing_total = flow.spacing.saturating_mul(count - 1);

    let plans: Vec<(NodeId, Sizing, SizeConstraints)> = children
        .iter()
        .map(|&child| (child, sizing_of(tree, child), constraints_of(tree, child)))
        .collect();

    let mut fills: u16 = 0;
    let mut sized_total: u16 = 0;
    let mains: Vec<Option<u16>> = plans
        .iter()
        .map(|(_, sizing, constraints)| {
            let (spec, _) = flow.axis.split(sizing.width, sizing.height);
            let (margin_main, _) = flow.axis.split(
                sizing.margin.horizontal_sum(),
                sizing.margin.vertical_sum(),
            );
            let (preferred, _) =
                flow.axis.split(constraints.preferred_width, constraints.preferred_height);
            let extent = match spec {
                Size::Fill => {
                    fills += 1;
                    return None;
                }
                Size::Fixed(_) | Size::Percent(_) => {
                    spec.resolve(main_avail, 0).saturating_add(margin_main)
                }
                Size::Auto => preferred,
            };
            sized_total = sized_total.saturating_add(extent);
            Some(extent)
        })
        .collect();

    let remaining = main_avail
        .saturating_sub(sized_total)
        .saturating_sub(spacing_total);
    let fill_each = if fills == 0 { 0 } else { remaining / fills };

    let mut cursor: u16 = 0;
    for ((child, sizing, constraints), main) in plans.into_iter().zip(mains) {
        let main = main.unwrap_or(fill_each);
        let (_, cross_spec) = flow.axis.split(sizing.width, sizing.height);
        let (_, margin_cross) = flow.axis.split(
            sizing.margin.horizontal_sum(),
            sizing.margin.vertical_sum(),
        );
        let (_, preferred_cross) =
            flow.axis.split(constraints.preferred_width, constraints.preferred_height);

        let stretch = flow.align == Align::Stretch || cross_spec.is_fill();
        let mut cross = if stretch {
            cross_avail
        } else {
            match cross_spec {
                Size::Fixed(_) | Size::Percent(_) => {
                    cross_spec.resolve(cross_avail, 0).saturating_add(margin_cross)
                }
                Size::Fill | Size::Auto => preferred_cross,
            }
        };
        if flow.clamp_cross {
            cross = cross.min(cross_avail);
        }
        let offset = if stretch || cross >= cross_avail {
            0
        } else {
            match flow.align {
                Align::Center => (cross_avail - cross) / 2,
                Align::End => cross_avail - cross,
                Align::Start | Align::Stretch => 0,
            }
        };

        let slot = flow.axis.rect(area, cursor, main, offset, cross);
        assign_bounds(tree, child, slot);
        cursor = cursor.saturating_add(main).saturating_add(flow.spacing);
    }
    cursor.saturating_sub(flow.spacing)
}

/// The root's extent on one axis of a `screen`-sized terminal.
fn resolve_root(spec: Size, screen: u16, preferred: u16, margin: u16) -> u16 {
    match spec {
        Size::Fill => screen,
        Size::Fixed(_) | Size::Percent(_) => spec.resolve(screen, 0).saturating_add(margin),
        Size::Auto => preferred.min(screen),
    }
}

/// Lay out the whole tree for a `width`×`height` terminal.
///
/// Returns every element in pre-order (frames included) with bounds set.
pub fn layout(tree: &mut LayoutTree, width: u16, height: u16) -> Vec<SharedElement> {
    let _span = debug_span!("layout", width, height).entered();
    if tree.is_empty() {
        return Vec::new();
    }
    let root = tree.root();
    let constraints = calculate_constraints(tree, root, None);
    let sizing = sizing_of(tree, root);
    let slot = Bounds::sized(
        resolve_root(
            sizing.width,
            width,
            constraints.preferred_width,
            sizing.margin.horizontal_sum(),
        ),
        resolve_root(
            sizing.height,
            height,
            constraints.preferred_height,
            sizing.margin.vertical_sum(),
        ),
    );
    assign_bounds(tree, root, slot);
    debug!(nodes = tree.len(), root = %slot, "layout complete");
    tree.elements()
}
