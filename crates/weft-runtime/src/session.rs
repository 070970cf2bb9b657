#![forbid(unsafe_code)]

//! The interaction loop.
//!
//! A [`Session`] owns everything one terminal session needs: the input
//! parser, click synthesizer, handler registry, focus and hover managers,
//! the renderer with its previous frame, and the application state.
//!
//! # Per-event flow
//!
//! 1. Bytes are decoded by the parser; mouse reports pass through the click
//!    synthesizer ([`Session::process_input`]).
//! 2. Each event is dispatched to the registry. A handler that cancels the
//!    event consumes it.
//! 3. Unconsumed keys go to the focused element, then to the built-in
//!    bindings (`tab`, `shift+tab`, `ctrl+c`). Mouse events update hover and
//!    go to the element under the pointer.
//! 4. Anything that changed the screen schedules a render.
//!
//! # Rendering
//!
//! [`Session::render`] rebuilds the current view's tree from the state,
//! lays it out, refreshes the focus cycle and hover target, paints a fresh
//! buffer and diffs it against the previous one. Scroll offsets of frames
//! with an id survive the rebuild.
//!
//! # Background mode
//!
//! With `background_workers > 0` handlers run on a [`HandlerPool`] and
//! state listeners on a [`TaskSet`]. The loop does not wait for them;
//! [`Session::flush`] does, and runs before shutdown.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, ErrorKind, Read, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use tracing::{debug, debug_span, info, trace, warn};
use weft_core::click::ClickSynthesizer;
use weft_core::event::{Event, Key, MouseButton, MouseEvent, MouseEventKind};
use weft_core::input_parser::InputParser;
use weft_layout::element::{Element, SharedElement, StateMap};
use weft_layout::{LayoutTree, NodeId, NodeSpec, layout, paint};
use weft_render::ansi;
use weft_render::buffer::ScreenBuffer;
use weft_render::renderer::{DiffRenderer, RenderedFrame};

use crate::config::RuntimeConfig;
use crate::focus::FocusManager;
use crate::handlers::{
    DispatchEvent, DispatchTicket, Handler, HandlerId, HandlerRegistry, panic_message,
};
use crate::hover::HoverManager;
use crate::pool::{HandlerPool, PoolError};
use crate::tasks::{TaskReport, TaskSet};

const READ_CHUNK: usize = 1024;

/// A named screen built from the application state.
pub trait View {
    fn name(&self) -> &str;

    /// Build the widget tree for the current state. Called on every render.
    fn build(&self, state: &StateMap) -> NodeSpec;
}

/// Callback run when a state key changes.
pub type StateListener = Arc<dyn Fn(&str, &serde_json::Value) + Send + Sync>;

/// Lets handlers on any thread end the loop.
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("no view named {0:?}")]
    UnknownView(String),
}

pub struct Session {
    config: RuntimeConfig,
    parser: InputParser,
    clicks: ClickSynthesizer,
    registry: HandlerRegistry,
    focus: FocusManager,
    hover: HoverManager,
    renderer: DiffRenderer,
    previous: Option<ScreenBuffer>,
    tree: Option<LayoutTree>,
    state: StateMap,
    listeners: Vec<StateListener>,
    views: Vec<Box<dyn View>>,
    current_view: Option<String>,
    scroll_offsets: HashMap<String, u16>,
    pool: Option<HandlerPool>,
    tickets: Vec<DispatchTicket>,
    tasks: TaskSet,
    needs_render: bool,
    quit: QuitHandle,
    last_mouse: Option<(u16, u16)>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("current_view", &self.current_view)
            .field("views", &self.views.len())
            .field("handlers", &self.registry.len())
            .field("focus", &self.focus)
            .field("state_keys", &self.state.len())
            .field("background", &self.pool.is_some())
            .field("needs_render", &self.needs_render)
            .finish()
    }
}

impl Session {
    /// Create a session. Starts the handler pool in background mode.
    pub fn new(config: RuntimeConfig) -> Result<Self, SessionError> {
        let pool = if config.is_background() {
            Some(HandlerPool::new(config.background_workers)?)
        } else {
            None
        };
        Ok(Self {
            parser: InputParser::new(),
            clicks: ClickSynthesizer::new(config.click),
            registry: HandlerRegistry::new(),
            focus: FocusManager::new(),
            hover: HoverManager::new(),
            renderer: DiffRenderer::new(&config.capabilities),
            previous: None,
            tree: None,
            state: StateMap::new(),
            listeners: Vec::new(),
            views: Vec::new(),
            current_view: None,
            scroll_offsets: HashMap::new(),
            pool,
            tickets: Vec::new(),
            tasks: TaskSet::new(),
            needs_render: true,
            quit: QuitHandle::default(),
            last_mouse: None,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Add a view. The first view registered becomes current.
    pub fn register_view(&mut self, view: impl View + 'static) {
        let name = view.name().to_string();
        self.views.retain(|v| v.name() != name);
        self.views.push(Box::new(view));
        if self.current_view.is_none() {
            self.set_view(Some(name));
        }
    }

    /// Switch to `name`, dropping the handlers of the view being left.
    pub fn navigate(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.views.iter().any(|v| v.name() == name) {
            return Err(SessionError::UnknownView(name.to_string()));
        }
        if self.current_view.as_deref() == Some(name) {
            return Ok(());
        }
        if let Some(old) = self.current_view.take() {
            self.registry.clear_view(&old);
        }
        self.focus.blur();
        self.focus.set_elements(Vec::new());
        self.hover.clear();
        self.tree = None;
        self.scroll_offsets.clear();
        self.set_view(Some(name.to_string()));
        info!(view = name, "navigated");
        Ok(())
    }

    pub fn current_view(&self) -> Option<&str> {
        self.current_view.as_deref()
    }

    fn set_view(&mut self, name: Option<String>) {
        self.registry.set_current_view(name.clone());
        self.current_view = name;
        self.needs_render = true;
    }

    // ------------------------------------------------------------------
    // Handlers and state
    // ------------------------------------------------------------------

    pub fn register_handler(&mut self, handler: Handler) -> HandlerId {
        self.registry.register(handler)
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.quit.is_requested()
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    /// Store `value` under `key`. Listeners run only when the value changed.
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        if self.state.get(&key) == Some(&value) {
            return;
        }
        self.state.insert(key.clone(), value.clone());
        self.needs_render = true;
        self.notify_state(&key, &value);
    }

    pub fn on_state_change<F>(&mut self, listener: F)
    where
        F: Fn(&str, &serde_json::Value) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    fn notify_state(&mut self, key: &str, value: &serde_json::Value) {
        trace!(key, "state changed");
        let event = DispatchEvent::state_change(key, value.clone());
        self.dispatch(event);

        for (index, listener) in self.listeners.iter().enumerate() {
            if self.pool.is_some() {
                let listener = Arc::clone(listener);
                let (key, value) = (key.to_string(), value.clone());
                let spawned = self
                    .tasks
                    .spawn(format!("state-listener-{index}"), move || listener(&key, &value));
                if let Err(err) = spawned {
                    warn!(error = %err, "state listener task not started");
                }
            } else if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(key, value))) {
                warn!(key, panic = %panic_message(payload.as_ref()), "state listener panicked");
            }
        }
    }

    /// Send a custom event through the registry.
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value) -> bool {
        self.dispatch(DispatchEvent::custom(name, data))
    }

    /// Dispatch `event`. Returns whether a handler consumed it; always `false`
    /// in background mode, where the outcome arrives later.
    fn dispatch(&mut self, mut event: DispatchEvent) -> bool {
        match &self.pool {
            Some(pool) => {
                match self.registry.dispatch_background(event, pool) {
                    Ok(ticket) => self.tickets.push(ticket),
                    Err(err) => warn!(error = %err, "background dispatch failed"),
                }
                false
            }
            None => {
                let outcome = self.registry.dispatch(&mut event);
                if outcome.invoked > 0 {
                    self.needs_render = true;
                }
                outcome.handled()
            }
        }
    }

    /// Collect finished background dispatches.
    fn reap_tickets(&mut self) {
        let before = self.tickets.len();
        self.tickets.retain(|ticket| ticket.try_outcome().is_none());
        if self.tickets.len() != before {
            self.needs_render = true;
        }
        self.tasks.reap_finished();
    }

    /// Wait for background dispatches and state listener tasks.
    pub fn flush(&mut self) -> TaskReport {
        for ticket in self.tickets.drain(..) {
            if ticket.wait().is_none() {
                warn!("background dispatch lost its worker");
            }
        }
        self.tasks.flush()
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Decode `bytes` and handle every completed event.
    ///
    /// A trailing ESC stays pending, since the rest of its sequence may
    /// arrive in the next read. Call [`flush_input`](Self::flush_input) once
    /// the input has been idle for the escape timeout.
    pub fn process_input(&mut self, bytes: &[u8], now: Instant) {
        for event in self.parser.parse(bytes) {
            let event = match event {
                Event::Mouse(mouse) => Event::Mouse(self.clicks.process(mouse, now)),
                other => other,
            };
            self.handle_event(event);
        }
    }

    /// Whether a lone ESC is waiting for more input.
    pub fn has_pending_escape(&self) -> bool {
        self.parser.has_lone_escape()
    }

    /// Take a pending lone ESC as the escape key.
    pub fn flush_input(&mut self) {
        if let Some(escape) = self.parser.flush() {
            self.handle_event(escape);
        }
    }

    /// Handle one decoded event. Mouse events must already be click-synthesized.
    pub fn handle_event(&mut self, event: Event) {
        let _span = debug_span!("handle_event").entered();
        self.reap_tickets();
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize { width, height } => {
                debug!(width, height, "terminal resized");
                self.dispatch(DispatchEvent::input(Event::Resize { width, height }));
                self.needs_render = true;
            }
            Event::Paste(text) => self.handle_paste(text),
            Event::Focus(gained) => {
                self.dispatch(DispatchEvent::input(Event::Focus(gained)));
            }
        }
    }

    fn handle_key(&mut self, key: Key) {
        let event = DispatchEvent::key(key.clone()).with_element(self.focus.current_id());
        if self.dispatch(event) {
            return;
        }
        if self.route_key_to_focus(&key) {
            return;
        }
        if key.is("tab") {
            self.focus.focus_next();
            self.needs_render = true;
        } else if key.is("shift+tab") {
            self.focus.focus_previous();
            self.needs_render = true;
        } else if key.is_ctrl_c() {
            debug!("unhandled ctrl+c, quitting");
            self.quit.request();
        }
    }

    fn route_key_to_focus(&mut self, key: &Key) -> bool {
        let Some(element) = self.focus.current() else {
            return false;
        };
        let consumed = match element.try_borrow_mut() {
            Ok(mut e) => e.handle_key(key),
            Err(_) => {
                warn!(key = %key, "focused element is borrowed, key dropped");
                false
            }
        };
        if consumed {
            self.needs_render = true;
            self.push_binding(&element);
        }
        consumed
    }

    fn handle_paste(&mut self, text: String) {
        let event = DispatchEvent::input(Event::Paste(text.clone()))
            .with_element(self.focus.current_id());
        if self.dispatch(event) {
            return;
        }
        for ch in text.chars().filter(|c| !c.is_control()) {
            self.route_key_to_focus(&Key::character(ch));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (x, y) = mouse.position();
        self.last_mouse = Some((x, y));
        let hit = self
            .tree
            .as_ref()
            .and_then(|tree| tree.hit(x, y).map(|node| (node, tree.element(node))));
        let (node, target) = match hit {
            Some((node, element)) => (Some(node), element),
            None => (None, None),
        };
        if self.hover.set_hovered(target.clone()) {
            self.needs_render = true;
        }

        let target_id = target
            .as_ref()
            .and_then(|e| e.try_borrow().ok().and_then(|e| e.id().map(str::to_string)));
        if self.dispatch(DispatchEvent::mouse(mouse).with_element(target_id)) {
            return;
        }

        if mouse.kind == MouseEventKind::Scroll {
            self.scroll_at(x, y, &mouse);
            return;
        }
        let (Some(node), Some(target)) = (node, target) else {
            return;
        };
        let local = self.to_layout_space(node, mouse);

        if matches!(mouse.kind, MouseEventKind::Press | MouseEventKind::Click)
            && self.focus.focus_element(&target)
        {
            self.needs_render = true;
        }

        let consumed = match target.try_borrow_mut() {
            Ok(mut e) => {
                let mut consumed = e.handle_mouse(&local);
                if local.is_click()
                    && let (Some(bounds), Some(selectable)) = (e.bounds(), e.as_selectable_mut())
                {
                    consumed |= selectable.select_at_row(local.y.saturating_sub(bounds.y));
                }
                consumed
            }
            Err(_) => false,
        };
        if consumed {
            self.needs_render = true;
            self.push_binding(&target);
        }
    }

    /// Scroll the element or frame under the pointer by one row.
    fn scroll_at(&mut self, x: u16, y: u16, mouse: &MouseEvent) {
        let delta = match mouse.button {
            MouseButton::ScrollUp => -1,
            MouseButton::ScrollDown => 1,
            _ => return,
        };
        let Some(tree) = &self.tree else {
            return;
        };
        // Innermost scrollable element first, then the enclosing frame.
        let mut candidates: Vec<SharedElement> = tree.element_at(x, y).into_iter().collect();
        candidates.extend(tree.scrollable_at(x, y));
        for element in candidates {
            let Ok(mut e) = element.try_borrow_mut() else {
                continue;
            };
            let id = e.id().map(str::to_string);
            let Some(scrollable) = e.as_scrollable_mut() else {
                continue;
            };
            if scrollable.scroll_by(delta) {
                let offset = scrollable.scroll_offset();
                if let Some(id) = id {
                    self.scroll_offsets.insert(id, offset);
                }
                self.needs_render = true;
            }
            return;
        }
    }

    fn to_layout_space(&self, node: NodeId, mouse: MouseEvent) -> MouseEvent {
        let shift = self.tree.as_ref().map_or(0, |tree| tree.scroll_shift(node));
        let y = u16::try_from(i32::from(mouse.y) + shift).unwrap_or(mouse.y);
        MouseEvent { y, ..mouse }
    }

    /// Store a bound widget's value into the state.
    fn push_binding(&mut self, element: &SharedElement) {
        let mut changed = None;
        if let Ok(mut e) = element.try_borrow_mut()
            && let Some(bindable) = e.as_bindable_mut()
            && let Some(key) = bindable.binding().map(str::to_string)
            && bindable.push(&mut self.state)
        {
            changed = self.state.get(&key).cloned().map(|value| (key, value));
        }
        if let Some((key, value)) = changed {
            self.needs_render = true;
            self.notify_state(&key, &value);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    pub fn request_render(&mut self) {
        self.needs_render = true;
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    pub fn hover(&self) -> &HoverManager {
        &self.hover
    }

    /// The tree from the last render.
    pub fn tree(&self) -> Option<&LayoutTree> {
        self.tree.as_ref()
    }

    /// The last painted frame.
    pub fn screen(&self) -> Option<&ScreenBuffer> {
        self.previous.as_ref()
    }

    /// Build, lay out, paint and diff one frame of `width`×`height`.
    pub fn render(&mut self, width: u16, height: u16) -> RenderedFrame {
        let _span = debug_span!("render", width, height).entered();
        let mut tree = match self.current_view() {
            Some(name) => self
                .views
                .iter()
                .find(|v| v.name() == name)
                .map(|view| LayoutTree::new(view.build(&self.state))),
            None => None,
        };

        let mut buffer = ScreenBuffer::new(width, height);
        if let Some(tree) = tree.as_mut() {
            self.restore_frame_scroll(tree);
            for element in tree.elements() {
                if let Ok(mut e) = element.try_borrow_mut()
                    && let Some(bindable) = e.as_bindable_mut()
                {
                    bindable.pull(&self.state);
                }
            }
            let elements = layout(tree, width, height);
            self.restore_element_scroll(tree);
            self.save_scroll(&elements);
            self.focus.set_elements(elements);
            let hovered = self.last_mouse.and_then(|(x, y)| tree.element_at(x, y));
            self.hover.set_hovered(hovered);

            let report = paint(tree, &mut buffer, self.config.capabilities);
            if !report.is_clean() {
                warn!(failures = report.failures.len(), "frame painted with failures");
            }
        } else {
            self.focus.set_elements(Vec::new());
            self.hover.clear();
        }

        if let Some(previous) = &self.previous
            && let Some(area) = previous.dirty_union()
        {
            buffer.mark_dirty(area);
        }
        for area in self.hover.take_dirty() {
            buffer.mark_dirty(area);
        }

        let frame = self.renderer.render(self.previous.as_ref(), &buffer);
        trace!(mode = ?frame.stats.mode, bytes = frame.stats.bytes, "frame ready");
        self.previous = Some(buffer);
        self.tree = tree;
        self.needs_render = false;
        frame
    }

    /// Put saved offsets back on frames. Runs before layout, which clamps
    /// them and positions the frame content.
    fn restore_frame_scroll(&self, tree: &LayoutTree) {
        for id in tree.pre_order() {
            if let Some(frame) = tree.frame(id) {
                let mut frame = frame.borrow_mut();
                let saved = Element::id(&*frame).and_then(|id| self.scroll_offsets.get(id));
                if let Some(&offset) = saved {
                    frame.set_scroll_offset(offset);
                }
            }
        }
    }

    /// Put saved offsets back on other scrollable elements. These clamp
    /// against their bounds, so this runs after layout.
    fn restore_element_scroll(&self, tree: &LayoutTree) {
        for id in tree.pre_order() {
            if tree.frame(id).is_some() {
                continue;
            }
            let Some(element) = tree.element(id) else {
                continue;
            };
            let Ok(mut e) = element.try_borrow_mut() else {
                continue;
            };
            let saved = e.id().and_then(|id| self.scroll_offsets.get(id)).copied();
            if let (Some(offset), Some(scrollable)) = (saved, e.as_scrollable_mut()) {
                scrollable.scroll_to(offset);
            }
        }
    }

    fn save_scroll(&mut self, elements: &[SharedElement]) {
        for element in elements {
            let Ok(mut e) = element.try_borrow_mut() else {
                continue;
            };
            let Some(id) = e.id().map(str::to_string) else {
                continue;
            };
            if let Some(scrollable) = e.as_scrollable_mut() {
                self.scroll_offsets.insert(id, scrollable.scroll_offset());
            }
        }
    }

    // ------------------------------------------------------------------
    // Terminal lifecycle
    // ------------------------------------------------------------------

    /// Bytes that put the terminal into UI mode.
    pub fn startup_sequence(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.config.alt_screen {
            out.extend_from_slice(ansi::ALT_SCREEN_ENTER);
        }
        out.extend_from_slice(ansi::CURSOR_HIDE);
        if self.config.mouse {
            out.extend_from_slice(ansi::MOUSE_ENABLE);
        }
        if self.paste_enabled() {
            out.extend_from_slice(ansi::BRACKETED_PASTE_ENABLE);
        }
        out
    }

    /// Bytes that undo [`startup_sequence`](Self::startup_sequence).
    pub fn shutdown_sequence(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.paste_enabled() {
            out.extend_from_slice(ansi::BRACKETED_PASTE_DISABLE);
        }
        if self.config.mouse {
            out.extend_from_slice(ansi::MOUSE_DISABLE);
        }
        out.extend_from_slice(ansi::SGR_RESET);
        out.extend_from_slice(ansi::CURSOR_SHOW);
        if self.config.alt_screen {
            out.extend_from_slice(ansi::ALT_SCREEN_LEAVE);
        }
        out
    }

    fn paste_enabled(&self) -> bool {
        self.config.bracketed_paste && self.config.capabilities.bracketed_paste
    }

    /// Run until end of input or a quit request.
    ///
    /// `reader` is drained on its own thread so a trailing ESC can be timed
    /// out; `size` is asked for the terminal size before every render. The
    /// terminal is restored even when the loop fails.
    pub fn run<R, W, S>(&mut self, reader: R, mut writer: W, mut size: S) -> Result<(), SessionError>
    where
        R: Read + Send + 'static,
        W: Write,
        S: FnMut() -> (u16, u16),
    {
        let input = spawn_reader(reader)?;
        writer.write_all(&self.startup_sequence())?;
        let result = self.run_loop(&input, &mut writer, &mut size);
        let report = self.flush();
        if report.panicked > 0 {
            warn!(panicked = report.panicked, "background tasks panicked");
        }
        writer.write_all(&self.shutdown_sequence())?;
        writer.flush()?;
        result
    }

    fn run_loop<W, S>(
        &mut self,
        input: &Receiver<Input>,
        writer: &mut W,
        size: &mut S,
    ) -> Result<(), SessionError>
    where
        W: Write,
        S: FnMut() -> (u16, u16),
    {
        loop {
            if self.needs_render {
                let (width, height) = size();
                let frame = self.render(width, height);
                if !frame.bytes.is_empty() {
                    writer.write_all(&frame.bytes)?;
                    writer.flush()?;
                }
            }
            if self.should_quit() {
                debug!("quit requested");
                return Ok(());
            }
            let next = if self.has_pending_escape() {
                match input.recv_timeout(self.config.escape_timeout) {
                    Ok(next) => next,
                    Err(RecvTimeoutError::Timeout) => {
                        self.flush_input();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => Input::Closed,
                }
            } else {
                input.recv().unwrap_or(Input::Closed)
            };
            match next {
                Input::Bytes(bytes) => self.process_input(&bytes, Instant::now()),
                Input::Failed(err) => return Err(err.into()),
                Input::Closed => {
                    debug!("end of input");
                    self.flush_input();
                    return Ok(());
                }
            }
        }
    }
}

/// What the reader thread hands to the loop.
#[derive(Debug)]
enum Input {
    Bytes(Vec<u8>),
    Failed(io::Error),
    Closed,
}

/// Drain `reader` on a named thread. The thread ends at end of input, on a
/// read error, or once the loop has dropped the receiver.
fn spawn_reader<R>(mut reader: R) -> io::Result<Receiver<Input>>
where
    R: Read + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("weft-input".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                let message = match reader.read(&mut chunk) {
                    Ok(0) => Input::Closed,
                    Ok(n) => Input::Bytes(chunk[..n].to_vec()),
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => Input::Failed(err),
                };
                let last = !matches!(message, Input::Bytes(_));
                if sender.send(message).is_err() || last {
                    return;
                }
            }
        })?;
    Ok(receiver)
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.tickets.is_empty() || !self.tasks.is_empty() {
            self.flush();
        }
    }
}
