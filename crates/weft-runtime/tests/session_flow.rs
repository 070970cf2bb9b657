#![forbid(unsafe_code)]

//! End-to-end behavior of a session driven through raw terminal bytes.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::json;
use tracing_test::traced_test;
use weft_core::geometry::Size;
use weft_layout::element::StateMap;
use weft_layout::{NodeSpec, StackProps};
use weft_render::ansi;
use weft_runtime::{EventType, Handler, HandlerError, RuntimeConfig, Session, View};
use weft_widgets::{List, Text, TextInput};

/// A name prompt: an input bound to `name` above a greeting built from it.
struct Greeter;

impl View for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn build(&self, state: &StateMap) -> NodeSpec {
        let name = state.get("name").and_then(|v| v.as_str()).unwrap_or("");
        NodeSpec::vstack(
            StackProps::new(),
            vec![
                NodeSpec::element(TextInput::new().id("name").bind("name")),
                NodeSpec::element(Text::new(format!("Hello, {name}"))),
            ],
        )
    }
}

/// Ten items in a three-row window.
struct Picker;

impl View for Picker {
    fn name(&self) -> &str {
        "picker"
    }

    fn build(&self, _state: &StateMap) -> NodeSpec {
        let list = List::new((0..10).map(|i| format!("item {i}")))
            .id("items")
            .bind("pick")
            .height(Size::Fixed(3));
        NodeSpec::vstack(StackProps::new(), vec![NodeSpec::element(list)])
    }
}

fn session_with(view: impl View + 'static, config: RuntimeConfig) -> Session {
    let mut session = Session::new(config).expect("session");
    session.register_view(view);
    session.render(20, 3);
    session
}

fn feed(session: &mut Session, bytes: &[u8]) {
    session.process_input(bytes, Instant::now());
}

fn row(session: &Session, y: u16) -> String {
    session.screen().map(|s| s.row_text(y)).unwrap_or_default()
}

type Log = Arc<Mutex<Vec<String>>>;

fn entries(log: &Log) -> Vec<String> {
    log.lock().map(|l| l.clone()).unwrap_or_default()
}

#[test]
fn typing_into_a_bound_input_updates_state_and_view() {
    let mut session = session_with(Greeter, RuntimeConfig::default());
    assert_eq!(session.focus().current_id().as_deref(), Some("name"));

    feed(&mut session, b"ada");
    assert_eq!(session.state().get("name"), Some(&json!("ada")));
    assert!(session.needs_render());

    session.render(20, 3);
    assert!(row(&session, 0).starts_with("ada"));
    assert!(row(&session, 1).starts_with("Hello, ada"));

    // The rebuilt input picked the value up again and keeps editing it.
    feed(&mut session, b"m");
    assert_eq!(session.state().get("name"), Some(&json!("adam")));
}

#[test]
fn cancelling_handler_keeps_key_from_focused_element() {
    let mut session = session_with(Greeter, RuntimeConfig::default());
    let log: Log = Arc::default();

    let seen = Arc::clone(&log);
    session.register_handler(
        Handler::global(move |event| {
            let Some(key) = event.as_key() else {
                return Ok(());
            };
            seen.lock()
                .map_err(|_| HandlerError::msg("poisoned"))?
                .push(format!("high:{}", key.name));
            if key.is("q") {
                event.cancel();
            }
            Ok(())
        })
        .on(EventType::Key)
        .priority(10),
    );
    let seen = Arc::clone(&log);
    session.register_handler(
        Handler::global(move |event| {
            if let Some(key) = event.as_key() {
                seen.lock()
                    .map_err(|_| HandlerError::msg("poisoned"))?
                    .push(format!("low:{}", key.name));
            }
            Ok(())
        })
        .on(EventType::Key),
    );

    feed(&mut session, b"qx");
    assert_eq!(entries(&log), ["high:q", "high:x", "low:x"]);
    assert_eq!(session.state().get("name"), Some(&json!("x")));
}

#[test]
fn state_change_handlers_see_bound_values() {
    let mut session = session_with(Greeter, RuntimeConfig::default());
    let log: Log = Arc::default();
    let seen = Arc::clone(&log);
    session.register_handler(
        Handler::global(move |event| {
            if let weft_runtime::Payload::StateChange { key, value } = &event.payload {
                seen.lock()
                    .map_err(|_| HandlerError::msg("poisoned"))?
                    .push(format!("{key}={value}"));
            }
            Ok(())
        })
        .on(EventType::StateChange),
    );

    feed(&mut session, b"hi");
    assert_eq!(entries(&log), ["name=\"h\"", "name=\"hi\""]);
}

#[test]
#[traced_test]
fn panicking_handler_is_logged_and_contained() {
    let mut session = session_with(Greeter, RuntimeConfig::default());
    session.register_handler(
        Handler::global(|_| panic!("boom"))
            .on(EventType::Custom("save".into()))
            .named("saver"),
    );

    assert!(!session.emit("save", json!({})));
    assert!(logs_contain("handler panicked"));
    assert!(logs_contain("saver"));

    // The session keeps working after the panic.
    feed(&mut session, b"ok");
    assert_eq!(session.state().get("name"), Some(&json!("ok")));
}

#[test]
fn wheel_scroll_survives_rebuild_and_click_selects() {
    let mut session = session_with(Picker, RuntimeConfig::default());
    assert!(row(&session, 0).starts_with("  item 0"));

    feed(&mut session, b"\x1b[<65;2;2M");
    session.render(20, 3);
    assert!(row(&session, 0).starts_with("  item 1"));

    feed(&mut session, b"\x1b[<65;2;2M");
    session.render(20, 3);
    assert!(row(&session, 0).starts_with("  item 2"));

    // Second visible row is item 3.
    feed(&mut session, b"\x1b[<0;3;2M\x1b[<0;3;2m");
    assert_eq!(session.focus().current_id().as_deref(), Some("items"));
    assert_eq!(session.state().get("pick"), Some(&json!("item 3")));

    session.render(20, 3);
    assert!(row(&session, 1).starts_with("> item 3"));
}

#[test]
fn run_writes_lifecycle_sequences_around_frames() {
    let mut session = Session::new(RuntimeConfig::default()).expect("session");
    session.register_view(Greeter);
    session.set_state("name", json!("ada"));

    let mut output = Vec::new();
    session
        .run(Cursor::new(b"x\x03".to_vec()), &mut output, || (20, 3))
        .expect("run");

    let startup = session.startup_sequence();
    let shutdown = session.shutdown_sequence();
    assert!(output.starts_with(&startup));
    assert!(output.ends_with(&shutdown));
    assert!(startup.windows(ansi::ALT_SCREEN_ENTER.len()).any(|w| w == ansi::ALT_SCREEN_ENTER));
    assert!(shutdown.windows(ansi::CURSOR_SHOW.len()).any(|w| w == ansi::CURSOR_SHOW));

    let plain = String::from_utf8_lossy(&strip_ansi_escapes::strip(&output)).into_owned();
    assert!(plain.contains("Hello, ada"));
    assert!(session.should_quit());
    assert_eq!(session.state().get("name"), Some(&json!("adax")));
}

#[test]
fn run_stops_at_end_of_input() {
    let mut session = Session::new(RuntimeConfig::default().alt_screen(false)).expect("session");
    session.register_view(Greeter);
    let mut output = Vec::new();
    session
        .run(Cursor::new(Vec::new()), &mut output, || (20, 3))
        .expect("run");
    assert!(!session.should_quit());
    assert!(!output.windows(ansi::ALT_SCREEN_ENTER.len()).any(|w| w == ansi::ALT_SCREEN_ENTER));
}

#[test]
fn run_resolves_trailing_escape_at_end_of_input() {
    let mut session = Session::new(RuntimeConfig::default().alt_screen(false)).expect("session");
    session.register_view(Greeter);
    let log: Log = Arc::default();
    let seen = Arc::clone(&log);
    session.register_handler(
        Handler::global(move |event| {
            if let Some(key) = event.as_key() {
                seen.lock()
                    .map_err(|_| HandlerError::msg("poisoned"))?
                    .push(key.name.clone());
            }
            Ok(())
        })
        .on(EventType::Key),
    );

    let mut output = Vec::new();
    session
        .run(Cursor::new(b"\x1b[Ba\x1b".to_vec()), &mut output, || (20, 3))
        .expect("run");
    assert_eq!(entries(&log), ["down", "a", "escape"]);
}

#[test]
fn background_mode_runs_handlers_and_listeners_off_thread() {
    let config = RuntimeConfig::default().background_workers(2);
    let mut session = session_with(Greeter, config);
    assert!(session.config().is_background());

    let log: Log = Arc::default();
    let seen = Arc::clone(&log);
    session.register_handler(
        Handler::global(move |event| {
            if let Some(key) = event.as_key() {
                seen.lock()
                    .map_err(|_| HandlerError::msg("poisoned"))?
                    .push(format!("key:{}", key.name));
            }
            event.cancel();
            Ok(())
        })
        .on(EventType::Key),
    );
    let seen = Arc::clone(&log);
    session.on_state_change(move |key, value| {
        if let Ok(mut log) = seen.lock() {
            log.push(format!("state:{key}={value}"));
        }
    });

    // The loop does not wait for the handler, so the key still reaches the
    // focused input even though the handler cancels it.
    feed(&mut session, b"z");
    assert_eq!(session.state().get("name"), Some(&json!("z")));

    let report = session.flush();
    assert_eq!(report.panicked, 0);
    let mut seen = entries(&log);
    seen.sort();
    assert_eq!(seen, ["key:z", "state:name=\"z\""]);
}
