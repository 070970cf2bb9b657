#![forbid(unsafe_code)]

//! Pointer hover tracking.

use tracing::{trace, warn};
use weft_core::geometry::Bounds;
use weft_layout::element::{SharedElement, same_element};

/// Tracks the hovered element and the regions a hover change dirtied.
#[derive(Default)]
pub struct HoverManager {
    current: Option<SharedElement>,
    dirty: Vec<Bounds>,
}

impl std::fmt::Debug for HoverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoverManager")
            .field("hovered", &self.current.is_some())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl HoverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move hover to `element`. Returns whether anything changed.
    ///
    /// The old element gets `on_hover_exit` before the new one gets
    /// `on_hover_enter`, and the bounds of both are queued as dirty.
    pub fn set_hovered(&mut self, element: Option<SharedElement>) -> bool {
        match (&self.current, &element) {
            (Some(a), Some(b)) if same_element(a, b) => return false,
            (None, None) => return false,
            _ => {}
        }
        if let Some(old) = self.current.take() {
            self.transition(&old, false);
        }
        if let Some(new) = &element {
            self.transition(new, true);
        }
        self.current = element;
        trace!(hovered = self.current.is_some(), "hover changed");
        true
    }

    pub fn current(&self) -> Option<&SharedElement> {
        self.current.as_ref()
    }

    /// Drain the regions dirtied since the last call.
    pub fn take_dirty(&mut self) -> Vec<Bounds> {
        std::mem::take(&mut self.dirty)
    }

    /// Forget the hovered element without firing hooks.
    pub fn clear(&mut self) {
        self.current = None;
        self.dirty.clear();
    }

    fn transition(&mut self, element: &SharedElement, enter: bool) {
        let Ok(mut e) = element.try_borrow_mut() else {
            warn!("hover hook skipped: element is borrowed");
            return;
        };
        if let Some(bounds) = e.bounds() {
            self.dirty.push(bounds);
        }
        if enter {
            e.on_hover_enter();
        } else {
            e.on_hover_exit();
        }
    }
}
