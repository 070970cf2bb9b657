#![forbid(unsafe_code)]

//! Scoped, prioritized event handlers.
//!
//! A [`HandlerRegistry`] holds callbacks registered at one of three scopes:
//!
//! - [`Scope::Global`] handlers see every event.
//! - [`Scope::View`] handlers see events only while their view is current.
//!   They are removed in bulk by [`HandlerRegistry::clear_view`].
//! - [`Scope::Element`] handlers see events carrying their element id.
//!
//! Matching handlers run in descending priority, ties in registration order.
//! Any handler may [`cancel`](DispatchEvent::cancel) the event, which stops
//! the remaining ones. A handler that returns an error or panics is logged
//! and skipped; the next handler still runs.

use std::any::Any;
use std::cmp::Reverse;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};
use weft_core::event::{Event, Key, MouseEvent};

use crate::pool::{HandlerPool, PoolError};

/// Where a handler listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    View(String),
    Element(String),
}

/// Event classes a handler can filter on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Key,
    Mouse,
    Resize,
    Paste,
    Focus,
    StateChange,
    Custom(String),
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Key => f.write_str("key"),
            EventType::Mouse => f.write_str("mouse"),
            EventType::Resize => f.write_str("resize"),
            EventType::Paste => f.write_str("paste"),
            EventType::Focus => f.write_str("focus"),
            EventType::StateChange => f.write_str("state_change"),
            EventType::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// What an event carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Input(Event),
    StateChange {
        key: String,
        value: serde_json::Value,
    },
    Custom {
        name: String,
        data: serde_json::Value,
    },
}

/// An event travelling through [`HandlerRegistry::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEvent {
    pub payload: Payload,
    /// Element the event is about (focused element for keys, the element
    /// under the pointer for mouse events).
    pub element_id: Option<String>,
    cancelled: bool,
}

impl DispatchEvent {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            element_id: None,
            cancelled: false,
        }
    }

    pub fn input(event: Event) -> Self {
        Self::new(Payload::Input(event))
    }

    pub fn key(key: Key) -> Self {
        Self::input(Event::Key(key))
    }

    pub fn mouse(event: MouseEvent) -> Self {
        Self::input(Event::Mouse(event))
    }

    pub fn state_change(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(Payload::StateChange {
            key: key.into(),
            value,
        })
    }

    pub fn custom(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self::new(Payload::Custom {
            name: name.into(),
            data,
        })
    }

    #[must_use]
    pub fn with_element(mut self, id: Option<String>) -> Self {
        self.element_id = id;
        self
    }

    pub fn event_type(&self) -> EventType {
        match &self.payload {
            Payload::Input(Event::Key(_)) => EventType::Key,
            Payload::Input(Event::Mouse(_)) => EventType::Mouse,
            Payload::Input(Event::Resize { .. }) => EventType::Resize,
            Payload::Input(Event::Paste(_)) => EventType::Paste,
            Payload::Input(Event::Focus(_)) => EventType::Focus,
            Payload::StateChange { .. } => EventType::StateChange,
            Payload::Custom { name, .. } => EventType::Custom(name.clone()),
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match &self.payload {
            Payload::Input(Event::Key(key)) => Some(key),
            _ => None,
        }
    }

    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match &self.payload {
            Payload::Input(Event::Mouse(event)) => Some(event),
            _ => None,
        }
    }

    /// Stop delivery to lower-priority handlers.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A handler failure. Logged by the registry, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Handler callback. `Send + Sync` so background dispatch can run it on a
/// worker thread.
pub type HandlerFn = Arc<dyn Fn(&mut DispatchEvent) -> HandlerResult + Send + Sync>;

/// Registration handle returned by [`HandlerRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// A callback with its matching rules.
#[derive(Clone)]
pub struct Handler {
    callback: HandlerFn,
    scope: Scope,
    event_type: Option<EventType>,
    priority: i32,
    name: Option<String>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("scope", &self.scope)
            .field("event_type", &self.event_type)
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// A global handler for every event type, priority 0.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut DispatchEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            scope: Scope::Global,
            event_type: None,
            priority: 0,
            name: None,
        }
    }

    pub fn global<F>(callback: F) -> Self
    where
        F: Fn(&mut DispatchEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(callback)
    }

    pub fn view<F>(view: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut DispatchEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(callback).scope(Scope::View(view.into()))
    }

    pub fn element<F>(id: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&mut DispatchEvent) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(callback).scope(Scope::Element(id.into()))
    }

    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Only receive events of this type.
    #[must_use]
    pub fn on(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Higher runs first.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Label used in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn scope_ref(&self) -> &Scope {
        &self.scope
    }

    pub fn event_type(&self) -> Option<&EventType> {
        self.event_type.as_ref()
    }

    pub fn priority_value(&self) -> i32 {
        self.priority
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    fn matches(&self, event: &DispatchEvent, event_type: &EventType, view: Option<&str>) -> bool {
        if self.event_type.as_ref().is_some_and(|t| t != event_type) {
            return false;
        }
        match &self.scope {
            Scope::Global => true,
            Scope::View(name) => view == Some(name.as_str()),
            Scope::Element(id) => event.element_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Handlers that were called, including failed ones.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
    pub cancelled: bool,
}

impl DispatchOutcome {
    /// Whether the event was consumed by a handler.
    pub fn handled(&self) -> bool {
        self.cancelled
    }
}

/// Pending result of [`HandlerRegistry::dispatch_background`].
#[derive(Debug)]
pub struct DispatchTicket {
    receiver: mpsc::Receiver<(DispatchOutcome, DispatchEvent)>,
}

impl DispatchTicket {
    /// Block until the handlers have run. `None` if the worker went away.
    pub fn wait(self) -> Option<(DispatchOutcome, DispatchEvent)> {
        self.receiver.recv().ok()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<(DispatchOutcome, DispatchEvent)> {
        self.receiver.recv_timeout(timeout).ok()
    }

    pub fn try_outcome(&self) -> Option<(DispatchOutcome, DispatchEvent)> {
        self.receiver.try_recv().ok()
    }
}

/// Registered handlers plus the current view name.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: Vec<(HandlerId, Handler)>,
    next_id: u64,
    current_view: Option<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        trace!(?id, scope = ?handler.scope, "handler registered");
        self.handlers.push((id, handler));
        id
    }

    /// Returns whether the handler was registered.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(hid, _)| *hid != id);
        before != self.handlers.len()
    }

    /// Remove every handler scoped to `view`. Returns how many were removed.
    pub fn clear_view(&mut self, view: &str) -> usize {
        let before = self.handlers.len();
        self.handlers
            .retain(|(_, h)| !matches!(&h.scope, Scope::View(name) if name == view));
        let removed = before - self.handlers.len();
        debug!(view, removed, "view handlers cleared");
        removed
    }

    pub fn set_current_view(&mut self, view: Option<String>) {
        self.current_view = view;
    }

    pub fn current_view(&self) -> Option<&str> {
        self.current_view.as_deref()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Matching handlers in invocation order.
    fn matching(&self, event: &DispatchEvent) -> SmallVec<[Handler; 8]> {
        let event_type = event.event_type();
        let view = self.current_view.as_deref();
        let mut matched: SmallVec<[Handler; 8]> = self
            .handlers
            .iter()
            .filter(|(_, h)| h.matches(event, &event_type, view))
            .map(|(_, h)| h.clone())
            .collect();
        // Stable: equal priorities keep registration order.
        matched.sort_by_key(|h| Reverse(h.priority));
        matched
    }

    /// Run matching handlers on the calling thread.
    pub fn dispatch(&self, event: &mut DispatchEvent) -> DispatchOutcome {
        let handlers = self.matching(event);
        run_handlers(&handlers, event)
    }

    /// Run matching handlers on a pool worker.
    ///
    /// Handlers still run one after another in priority order, so
    /// cancellation behaves as in [`dispatch`](Self::dispatch); the caller
    /// just does not wait for them.
    pub fn dispatch_background(
        &self,
        mut event: DispatchEvent,
        pool: &HandlerPool,
    ) -> Result<DispatchTicket, PoolError> {
        let handlers: Vec<Handler> = self.matching(&event).into_vec();
        let (sender, receiver) = mpsc::channel();
        pool.execute(move || {
            let outcome = run_handlers(&handlers, &mut event);
            let _ = sender.send((outcome, event));
        })?;
        Ok(DispatchTicket { receiver })
    }
}

fn run_handlers(handlers: &[Handler], event: &mut DispatchEvent) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for handler in handlers {
        if event.is_cancelled() {
            break;
        }
        outcome.invoked += 1;
        let result = catch_unwind(AssertUnwindSafe(|| (handler.callback)(event)))
            .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));
        match result {
            Ok(()) => {}
            Err(err @ HandlerError::Failed(_)) => {
                outcome.failed += 1;
                warn!(handler = handler.label(), event = %event.event_type(), error = %err, "handler failed");
            }
            Err(err @ HandlerError::Panicked(_)) => {
                outcome.failed += 1;
                error!(handler = handler.label(), event = %event.event_type(), error = %err, "handler panicked");
            }
        }
    }
    outcome.cancelled = event.is_cancelled();
    outcome
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, tag: &'static str) -> impl Fn(&mut DispatchEvent) -> HandlerResult + use<> {
        let log = Arc::clone(log);
        move |_| {
            log.lock().map_err(|_| HandlerError::msg("poisoned"))?.push(tag);
            Ok(())
        }
    }

    fn entries(log: &Log) -> Vec<&'static str> {
        log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    #[test]
    fn priority_order_then_registration_order() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::new(recorder(&log, "low")).priority(0));
        registry.register(Handler::new(recorder(&log, "high")).priority(10));
        registry.register(Handler::new(recorder(&log, "low2")).priority(0));

        let outcome = registry.dispatch(&mut DispatchEvent::key(Key::character('a')));
        assert_eq!(entries(&log), ["high", "low", "low2"]);
        assert_eq!(outcome.invoked, 3);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn cancel_stops_lower_priorities() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        let a = Arc::clone(&log);
        registry.register(
            Handler::new(move |event| {
                a.lock().map_err(|_| HandlerError::msg("poisoned"))?.push("A");
                event.cancel();
                Ok(())
            })
            .on(EventType::Key)
            .priority(10),
        );
        registry.register(Handler::new(recorder(&log, "B")).on(EventType::Key));

        let outcome = registry.dispatch(&mut DispatchEvent::key(Key::character('x')));
        assert_eq!(entries(&log), ["A"]);
        assert!(outcome.handled());
        assert_eq!(outcome.invoked, 1);
    }

    #[test]
    fn event_type_filter() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::new(recorder(&log, "key")).on(EventType::Key));
        registry.register(Handler::new(recorder(&log, "paste")).on(EventType::Paste));
        registry.dispatch(&mut DispatchEvent::input(Event::Paste("x".into())));
        assert_eq!(entries(&log), ["paste"]);
    }

    #[test]
    fn view_scope_follows_current_view() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::view("home", recorder(&log, "home")));
        registry.register(Handler::view("settings", recorder(&log, "settings")));

        registry.dispatch(&mut DispatchEvent::key(Key::character('a')));
        assert!(entries(&log).is_empty());

        registry.set_current_view(Some("home".into()));
        registry.dispatch(&mut DispatchEvent::key(Key::character('a')));
        assert_eq!(entries(&log), ["home"]);
    }

    #[test]
    fn element_scope_needs_matching_id() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::element("ok", recorder(&log, "ok")));
        registry.dispatch(&mut DispatchEvent::key(Key::special("enter")));
        registry.dispatch(
            &mut DispatchEvent::key(Key::special("enter")).with_element(Some("cancel".into())),
        );
        registry
            .dispatch(&mut DispatchEvent::key(Key::special("enter")).with_element(Some("ok".into())));
        assert_eq!(entries(&log), ["ok"]);
    }

    #[test]
    fn failures_are_isolated() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::new(|_| Err(HandlerError::msg("nope"))).priority(3));
        registry.register(Handler::new(|_| panic!("kaboom")).priority(2));
        registry.register(Handler::new(recorder(&log, "after")).priority(1));

        let outcome = registry.dispatch(&mut DispatchEvent::key(Key::character('a')));
        assert_eq!(entries(&log), ["after"]);
        assert_eq!(outcome.invoked, 3);
        assert_eq!(outcome.failed, 2);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn clear_view_only_removes_that_view() {
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::view("a", |_| Ok(())));
        registry.register(Handler::view("a", |_| Ok(())));
        registry.register(Handler::view("b", |_| Ok(())));
        registry.register(Handler::global(|_| Ok(())));
        assert_eq!(registry.clear_view("a"), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregister_by_id() {
        let mut registry = HandlerRegistry::new();
        let id = registry.register(Handler::global(|_| Ok(())));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn background_dispatch_keeps_order() {
        let log: Log = Arc::default();
        let mut registry = HandlerRegistry::new();
        registry.register(Handler::new(recorder(&log, "second")).priority(1));
        registry.register(Handler::new(recorder(&log, "first")).priority(5));
        let mut pool = HandlerPool::new(2).expect("pool starts");

        let ticket = registry
            .dispatch_background(DispatchEvent::key(Key::character('q')), &pool)
            .expect("pool accepts work");
        let (outcome, event) = ticket.wait().expect("worker replies");
        assert_eq!(outcome.invoked, 2);
        assert_eq!(event.as_key().map(|k| k.name.as_str()), Some("q"));
        assert_eq!(entries(&log), ["first", "second"]);
        pool.shutdown();
    }

    #[test]
    fn state_change_event_type() {
        let event = DispatchEvent::state_change("count", serde_json::json!(3));
        assert_eq!(event.event_type(), EventType::StateChange);
        assert_eq!(
            DispatchEvent::custom("save", serde_json::Value::Null).event_type().to_string(),
            "custom:save"
        );
    }
}
