#![forbid(unsafe_code)]

//! Paints a laid-out tree into a [`ScreenBuffer`].
//!
//! One pre-order walk. Each element gets a [`PaintContext`] at its bounds,
//! shifted up by the scroll offsets of its enclosing frames. A frame paints
//! its own chrome, then pushes a scissor for its content area so descendants
//! cannot draw over the border or outside the viewport.
//!
//! Painting is isolated per element: a panic inside `render_to` is caught,
//! logged and recorded in the [`PaintReport`], and the walk moves on. Whatever
//! was painted before the failure stays in the buffer.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, debug_span, error};
use weft_core::TerminalCapabilities;
use weft_core::geometry::Bounds;
use weft_render::buffer::ScreenBuffer;
use weft_render::paint::PaintContext;

use crate::element::SharedElement;
use crate::frame::Overflow;
use crate::tree::{LayoutNode, LayoutTree, NodeId};

/// An element that failed to paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub node: NodeId,
    pub element_id: Option<String>,
    pub message: String,
}

/// Outcome of one paint pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Elements whose `render_to` ran to completion.
    pub painted: usize,
    pub failures: Vec<RenderFailure>,
}

impl PaintReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Walk<'a> {
    tree: &'a LayoutTree,
    buffer: &'a mut ScreenBuffer,
    caps: TerminalCapabilities,
    report: PaintReport,
}

/// Paint every element of `tree` into `buffer`.
pub fn paint(tree: &LayoutTree, buffer: &mut ScreenBuffer, caps: TerminalCapabilities) -> PaintReport {
    let _span = debug_span!("paint", width = buffer.width(), height = buffer.height()).entered();
    if tree.is_empty() {
        return PaintReport::default();
    }
    let depth = buffer.scissor_depth();
    let mut walk = Walk {
        tree,
        buffer,
        caps,
        report: PaintReport::default(),
    };
    walk.node(tree.root(), 0, false);
    while walk.buffer.scissor_depth() > depth {
        walk.buffer.pop_scissor();
    }
    debug!(
        painted = walk.report.painted,
        failed = walk.report.failures.len(),
        "paint complete"
    );
    walk.report
}

impl Walk<'_> {
    /// `shift` is the total scroll offset of enclosing frames; `wrap` is set
    /// inside wrapping frames.
    fn node(&mut self, id: NodeId, shift: i32, wrap: bool) {
        let tree = self.tree;
        let Some(entry) = tree.get(id) else {
            return;
        };
        if let (Some(element), Some(bounds)) = (entry.node.element(), entry.bounds) {
            self.element(id, &element, bounds, shift, wrap);
        }

        let LayoutNode::Frame(frame) = &entry.node else {
            for &child in &entry.children {
                self.node(child, shift, wrap);
            }
            return;
        };

        let Ok(frame) = frame.try_borrow() else {
            return;
        };
        let (Some(inner), offset, overflow) = (
            frame.inner_bounds(),
            i32::from(frame.scroll_state().offset),
            frame.overflow(),
        ) else {
            return;
        };
        drop(frame);

        let Some(clip) = self.content_clip(inner, shift, overflow) else {
            return;
        };
        self.buffer.push_scissor(clip);
        for &child in &entry.children {
            self.node(child, shift + offset, overflow == Overflow::Wrap);
        }
        self.buffer.pop_scissor();
    }

    /// Screen rectangle a frame's content may draw into.
    fn content_clip(&self, inner: Bounds, shift: i32, overflow: Overflow) -> Option<Bounds> {
        let top = i32::from(inner.y) - shift;
        let bottom = top + i32::from(inner.height);
        let top = top.max(0);
        if bottom <= top {
            return None;
        }
        let y = u16::try_from(top).ok()?;
        let height = u16::try_from(bottom - top).ok()?;
        Some(match overflow {
            Overflow::Visible => Bounds::new(0, y, self.buffer.width(), height),
            Overflow::Clip | Overflow::Wrap => Bounds::new(inner.x, y, inner.width, height),
        })
    }

    fn element(&mut self, id: NodeId, element: &SharedElement, bounds: Bounds, shift: i32, wrap: bool) {
        let Ok(element) = element.try_borrow() else {
            self.fail(id, None, "element is already borrowed".to_string());
            return;
        };
        let caps = self.caps;
        let buffer = &mut *self.buffer;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = PaintContext::with_origin(
                buffer,
                i32::from(bounds.x),
                i32::from(bounds.y) - shift,
                bounds.width,
                bounds.height,
                caps,
            )
            .with_wrap(wrap);
            element.render_to(&mut ctx);
        }));
        match result {
            Ok(()) => self.report.painted += 1,
            Err(payload) => {
                let element_id = element.id().map(str::to_string);
                self.fail(id, element_id, panic_message(payload.as_ref()));
            }
        }
    }

    fn fail(&mut self, node: NodeId, element_id: Option<String>, message: String) {
        error!(
            node = node.index(),
            element = element_id.as_deref().unwrap_or("<anonymous>"),
            %message,
            "element failed to paint"
        );
        self.report.failures.push(RenderFailure {
            node,
            element_id,
            message,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
