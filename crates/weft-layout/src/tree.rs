#![forbid(unsafe_code)]

//! Arena-backed layout tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]; the
//! parent relation is an index, so "which frame scrolls this node" is a
//! lookup rather than a back-pointer.
//!
//! The tree is built once from a nested [`NodeSpec`] and then re-laid-out in
//! place by [`crate::engine::layout`]. Geometry queries here (`screen_bounds`,
//! `element_at`, `scrollable_at`) account for frame scrolling and clipping.

use std::cell::RefCell;
use std::rc::Rc;

use weft_core::geometry::{Bounds, Sides, Size};

use crate::element::{Element, SharedElement, shared};
use crate::engine::SizeConstraints;
use crate::frame::{Frame, Overflow};

/// Index of a node in its [`LayoutTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Horizontal placement of a child narrower than its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
    Stretch,
}

/// Vertical placement of a child shorter than its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
    Stretch,
}

/// Sizing and spacing for a stack container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackProps {
    pub width: Size,
    pub height: Size,
    /// Cells between adjacent children along the main axis.
    pub spacing: u16,
    pub padding: Sides,
    pub margin: Sides,
    pub align: HAlign,
    pub valign: VAlign,
}

impl StackProps {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn width(mut self, width: Size) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn height(mut self, height: Size) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn align(mut self, align: HAlign) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }
}

/// Nested description a tree is built from.
pub enum NodeSpec {
    Element(SharedElement),
    VStack(StackProps, Vec<NodeSpec>),
    HStack(StackProps, Vec<NodeSpec>),
    Frame(Rc<RefCell<Frame>>, Vec<NodeSpec>),
}

impl NodeSpec {
    pub fn element<E: Element + 'static>(element: E) -> Self {
        NodeSpec::Element(shared(element))
    }

    pub fn vstack(props: StackProps, children: Vec<NodeSpec>) -> Self {
        NodeSpec::VStack(props, children)
    }

    pub fn hstack(props: StackProps, children: Vec<NodeSpec>) -> Self {
        NodeSpec::HStack(props, children)
    }

    pub fn frame(frame: Frame, children: Vec<NodeSpec>) -> Self {
        NodeSpec::Frame(Rc::new(RefCell::new(frame)), children)
    }
}

/// A node's variant payload.
pub enum LayoutNode {
    Element(SharedElement),
    VStack(StackProps),
    HStack(StackProps),
    Frame(Rc<RefCell<Frame>>),
}

impl LayoutNode {
    /// The element this node paints, if any. Frames are elements too.
    pub fn element(&self) -> Option<SharedElement> {
        match self {
            LayoutNode::Element(element) => Some(element.clone()),
            LayoutNode::Frame(frame) => Some(frame.clone() as SharedElement),
            LayoutNode::VStack(_) | LayoutNode::HStack(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LayoutNode::Element(_) => "element",
            LayoutNode::VStack(_) => "vstack",
            LayoutNode::HStack(_) => "hstack",
            LayoutNode::Frame(_) => "frame",
        }
    }
}

pub struct NodeEntry {
    pub node: LayoutNode,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Output of the bottom-up pass.
    pub constraints: SizeConstraints,
    /// Output of the top-down pass (excluding margin).
    pub bounds: Option<Bounds>,
}

pub struct LayoutTree {
    nodes: Vec<NodeEntry>,
}

impl LayoutTree {
    pub fn new(spec: NodeSpec) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(spec, None);
        tree
    }

    fn insert(&mut self, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let (node, children) = match spec {
            NodeSpec::Element(element) => (LayoutNode::Element(element), Vec::new()),
            NodeSpec::VStack(props, children) => (LayoutNode::VStack(props), children),
            NodeSpec::HStack(props, children) => (LayoutNode::HStack(props), children),
            NodeSpec::Frame(frame, children) => (LayoutNode::Frame(frame), children),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            node,
            parent,
            children: Vec::with_capacity(children.len()),
            constraints: SizeConstraints::default(),
            bounds: None,
        });
        for child in children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// The root is always the first node.
    #[inline]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |entry| entry.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|entry| entry.parent)
    }

    pub fn bounds(&self, id: NodeId) -> Option<Bounds> {
        self.get(id).and_then(|entry| entry.bounds)
    }

    pub fn frame(&self, id: NodeId) -> Option<&Rc<RefCell<Frame>>> {
        match &self.get(id)?.node {
            LayoutNode::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn element(&self, id: NodeId) -> Option<SharedElement> {
        self.get(id)?.node.element()
    }

    /// Nearest ancestor frame of `id`.
    pub fn parent_frame(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.frame(ancestor).is_some() {
                return Some(ancestor);
            }
            current = self.parent(ancestor);
        }
        None
    }

    /// Node ids in pre-order (parents before children, siblings in order).
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if self.get(id).is_none() {
                continue;
            }
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Every element in pre-order, frames included.
    pub fn elements(&self) -> Vec<SharedElement> {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.element(id))
            .collect()
    }

    /// Total rows `id` is shifted up by scrolled ancestor frames.
    pub fn scroll_shift(&self, id: NodeId) -> i32 {
        let mut shift = 0;
        let mut current = self.parent_frame(id);
        while let Some(frame_id) = current {
            if let Some(frame) = self.frame(frame_id) {
                shift += i32::from(frame.borrow().scroll_state().offset);
            }
            current = self.parent_frame(frame_id);
        }
        shift
    }

    /// Screen area ancestors allow `id` to paint into.
    ///
    /// `None` when an ancestor clips it away entirely.
    pub fn clip_of(&self, id: NodeId, screen: Bounds) -> Option<Bounds> {
        let mut clip = screen;
        let mut current = self.parent_frame(id);
        while let Some(frame_id) = current {
            let frame_clip = self.frame_clip(frame_id, screen)?;
            clip = clip.intersection(&frame_clip)?;
            current = self.parent_frame(frame_id);
        }
        Some(clip)
    }

    /// On-screen clip a frame applies to its descendants.
    pub(crate) fn frame_clip(&self, frame_id: NodeId, screen: Bounds) -> Option<Bounds> {
        let frame = self.frame(frame_id)?.borrow();
        let inner = frame.inner_bounds()?;
        let visible = self.visible_rect(frame_id, inner)?;
        if frame.overflow() == Overflow::Visible {
            let widened = Bounds::new(screen.x, visible.y, screen.width, visible.height);
            return widened.intersection(&screen);
        }
        visible.intersection(&screen)
    }

    /// `rect` (in `id`'s layout space) shifted onto the screen.
    fn visible_rect(&self, id: NodeId, rect: Bounds) -> Option<Bounds> {
        let top = i32::from(rect.y) - self.scroll_shift(id);
        let bottom = top + i32::from(rect.height);
        let top = top.max(0);
        if bottom <= top {
            return None;
        }
        let y = u16::try_from(top).ok()?;
        let height = u16::try_from(bottom - top).ok()?;
        Some(Bounds::new(rect.x, y, rect.width, height))
    }

    /// Visible on-screen part of a node, after scrolling and clipping.
    pub fn screen_bounds(&self, id: NodeId, screen: Bounds) -> Option<Bounds> {
        let bounds = self.bounds(id)?;
        let shifted = self.visible_rect(id, bounds)?;
        let clip = self.clip_of(id, screen)?;
        shifted.intersection(&clip)
    }

    /// Innermost element whose visible area contains `(x, y)`.
    pub fn element_at(&self, x: u16, y: u16) -> Option<SharedElement> {
        self.hit(x, y).and_then(|id| self.element(id))
    }

    /// Innermost scrollable frame whose visible area contains `(x, y)`.
    pub fn scrollable_at(&self, x: u16, y: u16) -> Option<SharedElement> {
        self.scrollable_hit(x, y).and_then(|id| self.element(id))
    }

    /// Node of the innermost element under `(x, y)`.
    pub fn hit(&self, x: u16, y: u16) -> Option<NodeId> {
        self.node_at(x, y, |node| node.element().is_some())
    }

    /// Node of the innermost scrollable frame under `(x, y)`.
    pub fn scrollable_hit(&self, x: u16, y: u16) -> Option<NodeId> {
        self.node_at(x, y, |node| {
            matches!(node, LayoutNode::Frame(frame) if frame.borrow().is_scrollable())
        })
    }

    /// Node holding `element`, if it is part of this tree.
    pub fn find(&self, element: &SharedElement) -> Option<NodeId> {
        self.pre_order().into_iter().find(|&id| {
            self.element(id)
                .is_some_and(|candidate| crate::element::same_element(&candidate, element))
        })
    }

    fn node_at(&self, x: u16, y: u16, accept: impl Fn(&LayoutNode) -> bool) -> Option<NodeId> {
        let screen = Bounds::sized(u16::MAX, u16::MAX);
        self.pre_order().into_iter().rev().find(|&id| {
            self.get(id).is_some_and(|entry| accept(&entry.node))
                && self
                    .screen_bounds(id, screen)
                    .is_some_and(|area| area.contains_point(x, y))
        })
    }
}
