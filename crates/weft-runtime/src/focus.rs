#![forbid(unsafe_code)]

//! Keyboard focus over the focusable elements of the live tree.
//!
//! The manager holds shared handles, not copies. The list is rebuilt
//! wholesale after each layout pass by [`FocusManager::set_elements`], which
//! keeps focus on the element with the same id when there is one.
//!
//! Every change of the focused element calls `on_blur` on the old element
//! before `on_focus` on the new one.
//!
//! # Focus traps
//!
//! An overlay narrows the cycle with [`FocusManager::set_focus_filter`]
//! after taking a [`FocusSnapshot`] with [`FocusManager::save_state`].
//! [`FocusManager::restore_state`] puts the previous cycle back exactly.

use std::fmt;

use tracing::{trace, warn};
use weft_layout::element::{Element, SharedElement, same_element};

/// A saved focus cycle.
#[derive(Clone, Default)]
pub struct FocusSnapshot {
    elements: Vec<SharedElement>,
    current: Option<usize>,
}

impl FocusSnapshot {
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Identity comparison: same handles in the same order, same index.
impl PartialEq for FocusSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
            && self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| same_element(a, b))
    }
}

impl fmt::Debug for FocusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusSnapshot")
            .field("elements", &self.elements.len())
            .field("current", &self.current)
            .finish()
    }
}

#[derive(Default)]
pub struct FocusManager {
    elements: Vec<SharedElement>,
    current: Option<usize>,
}

impl fmt::Debug for FocusManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusManager")
            .field("elements", &self.elements.len())
            .field("current", &self.current)
            .field("current_id", &self.current_id())
            .finish()
    }
}

fn is_candidate(element: &SharedElement) -> bool {
    element
        .try_borrow()
        .is_ok_and(|e| e.is_focusable() && e.bounds().is_some())
}

fn id_of(element: &SharedElement) -> Option<String> {
    element
        .try_borrow()
        .ok()
        .and_then(|e| e.id().map(str::to_string))
}

fn notify(element: &SharedElement, hook: fn(&mut dyn Element)) {
    match element.try_borrow_mut() {
        Ok(mut e) => hook(&mut *e),
        Err(_) => warn!("focus hook skipped: element is borrowed"),
    }
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cycle with the focusable, laid-out members of `elements`.
    ///
    /// Focus moves to the element with the previously focused id, else to
    /// the previous index, else to the first element.
    pub fn set_elements(&mut self, elements: impl IntoIterator<Item = SharedElement>) {
        let previous = self.current();
        let previous_id = previous.as_ref().and_then(id_of);
        let previous_index = self.current;

        self.elements = elements.into_iter().filter(is_candidate).collect();
        self.current = None;

        let target = previous_id
            .as_deref()
            .and_then(|id| self.index_of_id(id))
            .or_else(|| previous_index.filter(|&i| i < self.elements.len()))
            .or_else(|| (!self.elements.is_empty()).then_some(0));
        self.switch(previous, target);
    }

    /// Narrow the cycle to `elements` (an overlay) and focus its first member.
    pub fn set_focus_filter(&mut self, elements: impl IntoIterator<Item = SharedElement>) {
        let previous = self.current();
        self.elements = elements.into_iter().filter(is_candidate).collect();
        self.current = None;
        let target = (!self.elements.is_empty()).then_some(0);
        self.switch(previous, target);
    }

    pub fn save_state(&self) -> FocusSnapshot {
        FocusSnapshot {
            elements: self.elements.clone(),
            current: self.current,
        }
    }

    /// Put back a saved cycle, firing blur and focus hooks.
    pub fn restore_state(&mut self, snapshot: FocusSnapshot) {
        let previous = self.current();
        self.elements = snapshot.elements;
        self.current = None;
        let target = snapshot.current.filter(|&i| i < self.elements.len());
        self.switch(previous, target);
    }

    /// Advance to the next element, wrapping. With nothing focused, focus the
    /// first. Returns the new index.
    pub fn focus_next(&mut self) -> Option<usize> {
        let len = self.elements.len();
        if len == 0 {
            return None;
        }
        let next = self.current.map_or(0, |i| (i + 1) % len);
        self.move_to(Some(next));
        self.current
    }

    /// Step back to the previous element, wrapping. With nothing focused,
    /// focus the last.
    pub fn focus_previous(&mut self) -> Option<usize> {
        let len = self.elements.len();
        if len == 0 {
            return None;
        }
        let next = self.current.map_or(len - 1, |i| (i + len - 1) % len);
        self.move_to(Some(next));
        self.current
    }

    /// Focus `element` if it is in the cycle.
    pub fn focus_element(&mut self, element: &SharedElement) -> bool {
        match self.elements.iter().position(|e| same_element(e, element)) {
            Some(index) => {
                self.move_to(Some(index));
                true
            }
            None => false,
        }
    }

    pub fn focus_id(&mut self, id: &str) -> bool {
        match self.index_of_id(id) {
            Some(index) => {
                self.move_to(Some(index));
                true
            }
            None => false,
        }
    }

    /// Focus the element whose layout bounds contain `(x, y)`.
    pub fn focus_at(&mut self, x: u16, y: u16) -> bool {
        let hit = self.elements.iter().rposition(|e| {
            e.try_borrow()
                .ok()
                .and_then(|e| e.bounds())
                .is_some_and(|b| b.contains_point(x, y))
        });
        match hit {
            Some(index) => {
                self.move_to(Some(index));
                true
            }
            None => false,
        }
    }

    pub fn blur(&mut self) {
        self.move_to(None);
    }

    pub fn current(&self) -> Option<SharedElement> {
        self.current.and_then(|i| self.elements.get(i)).cloned()
    }

    pub fn current_id(&self) -> Option<String> {
        self.current().as_ref().and_then(id_of)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn elements(&self) -> &[SharedElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn index_of_id(&self, id: &str) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| id_of(e).as_deref() == Some(id))
    }

    fn move_to(&mut self, target: Option<usize>) {
        let previous = self.current();
        self.switch(previous, target);
    }

    /// Set `current` to `target`, firing hooks when the element changes.
    fn switch(&mut self, previous: Option<SharedElement>, target: Option<usize>) {
        self.current = target;
        let next = self.current();
        match (&previous, &next) {
            (Some(a), Some(b)) if same_element(a, b) => return,
            (None, None) => return,
            _ => {}
        }
        if let Some(old) = &previous {
            notify(old, |e| e.on_blur());
        }
        if let Some(new) = &next {
            notify(new, |e| e.on_focus());
        }
        trace!(index = ?self.current, id = ?self.current_id(), "focus changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::geometry::Bounds;
    use weft_layout::element::{ElementState, shared};

    struct Field {
        state: ElementState,
        log: Vec<&'static str>,
    }

    impl Element for Field {
        fn state(&self) -> &ElementState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut ElementState {
            &mut self.state
        }
        fn on_focus(&mut self) {
            self.state.focused = true;
            self.log.push("focus");
        }
        fn on_blur(&mut self) {
            self.state.focused = false;
            self.log.push("blur");
        }
    }

    fn field(id: &str, y: u16) -> SharedElement {
        let mut state = ElementState::new().with_id(id).focusable(true);
        state.bounds = Some(Bounds::new(0, y, 10, 1));
        shared(Field {
            state,
            log: Vec::new(),
        })
    }

    fn fields(n: u16) -> Vec<SharedElement> {
        (0..n).map(|i| field(&format!("f{i}"), i)).collect()
    }

    #[test]
    fn cycle_wraps_forward() {
        let mut focus = FocusManager::new();
        focus.set_elements(fields(3));
        focus.blur();
        assert_eq!(focus.current_index(), None);
        let seen: Vec<_> = (0..4).map(|_| focus.focus_next()).collect();
        assert_eq!(seen, [Some(0), Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn cycle_wraps_backward() {
        let mut focus = FocusManager::new();
        focus.set_elements(fields(3));
        focus.blur();
        assert_eq!(focus.focus_previous(), Some(2));
        assert_eq!(focus.focus_previous(), Some(1));
        focus.focus_previous();
        assert_eq!(focus.focus_previous(), Some(2));
    }

    #[test]
    fn set_elements_filters_and_focuses_first() {
        let plain = shared(Field {
            state: ElementState::new().with_id("label"),
            log: Vec::new(),
        });
        let unplaced = shared(Field {
            state: ElementState::new().with_id("hidden").focusable(true),
            log: Vec::new(),
        });
        let mut elements = vec![plain, unplaced];
        elements.extend(fields(2));
        let mut focus = FocusManager::new();
        focus.set_elements(elements);
        assert_eq!(focus.len(), 2);
        assert_eq!(focus.current_id().as_deref(), Some("f0"));
    }

    #[test]
    fn rebuild_keeps_focus_by_id() {
        let mut focus = FocusManager::new();
        focus.set_elements(fields(3));
        focus.focus_id("f2");
        let old = focus.current();

        // Fresh instances, reordered.
        let rebuilt = vec![field("f2", 0), field("f0", 1), field("f1", 2)];
        focus.set_elements(rebuilt.clone());
        assert_eq!(focus.current_index(), Some(0));
        assert!(rebuilt[0].borrow().is_focused());
        let old = old.expect("was focused");
        assert!(!old.borrow().is_focused());
    }

    #[test]
    fn rebuild_falls_back_to_index() {
        let mut focus = FocusManager::new();
        focus.set_elements(fields(3));
        focus.focus_id("f1");
        focus.set_elements(vec![field("a", 0), field("b", 1), field("c", 2)]);
        assert_eq!(focus.current_id().as_deref(), Some("b"));
        focus.focus_id("c");
        focus.set_elements(vec![field("x", 0)]);
        assert_eq!(focus.current_id().as_deref(), Some("x"));
        focus.set_elements(Vec::new());
        assert_eq!(focus.current_index(), None);
    }

    #[test]
    fn hooks_fire_blur_then_focus() {
        let elements = fields(2);
        let mut focus = FocusManager::new();
        focus.set_elements(elements.clone());
        focus.focus_next();

        let log_of = |e: &SharedElement| {
            let e = e.borrow();
            (e.is_focused(), e.id().map(str::to_string))
        };
        assert_eq!(log_of(&elements[0]), (false, Some("f0".into())));
        assert_eq!(log_of(&elements[1]), (true, Some("f1".into())));
    }

    #[test]
    fn same_element_is_not_refocused() {
        let elements = fields(1);
        let mut focus = FocusManager::new();
        focus.set_elements(elements.clone());
        focus.set_elements(elements.clone());
        focus.focus_next();
        // Only the first transition fired.
        let e = elements[0].borrow();
        assert!(e.is_focused());
    }

    #[test]
    fn trap_restores_exact_state() {
        let main = fields(4);
        let mut focus = FocusManager::new();
        focus.set_elements(main.clone());
        focus.focus_id("f2");
        let saved = focus.save_state();

        let overlay = vec![field("ok", 10), field("cancel", 11)];
        focus.set_focus_filter(overlay.clone());
        assert_eq!(focus.len(), 2);
        assert_eq!(focus.current_id().as_deref(), Some("ok"));
        assert!(!main[2].borrow().is_focused());

        focus.restore_state(saved.clone());
        assert_eq!(focus.save_state(), saved);
        assert_eq!(focus.current_index(), Some(2));
        assert!(main[2].borrow().is_focused());
        assert!(!overlay[0].borrow().is_focused());
    }

    #[test]
    fn focus_by_point() {
        let mut focus = FocusManager::new();
        focus.set_elements(fields(3));
        assert!(focus.focus_at(3, 1));
        assert_eq!(focus.current_id().as_deref(), Some("f1"));
        assert!(!focus.focus_at(50, 50));
        assert_eq!(focus.current_index(), Some(1));
    }

    proptest::proptest! {
        #[test]
        fn exactly_one_element_is_focused(n in 1u16..8, steps in proptest::collection::vec(proptest::bool::ANY, 0..32)) {
            let elements = fields(n);
            let mut focus = FocusManager::new();
            focus.set_elements(elements.clone());
            let mut expected = 0usize;
            let len = usize::from(n);
            for forward in steps {
                if forward {
                    focus.focus_next();
                    expected = (expected + 1) % len;
                } else {
                    focus.focus_previous();
                    expected = (expected + len - 1) % len;
                }
            }
            proptest::prop_assert_eq!(focus.current_index(), Some(expected));
            let focused = elements.iter().filter(|e| e.borrow().is_focused()).count();
            proptest::prop_assert_eq!(focused, 1);
        }
    }
}
