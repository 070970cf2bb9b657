#![forbid(unsafe_code)]

//! Weft runtime
//!
//! Ties the input protocol, layout engine and renderer into an interaction
//! loop.
//!
//! # Key Components
//!
//! - [`Session`] - the loop: decode, dispatch, focus/hover, render
//! - [`View`] - a named screen built from application state
//! - [`HandlerRegistry`] - scoped, prioritized, cancellable handlers
//! - [`FocusManager`] / [`HoverManager`] - focus cycle with trapping, hover
//! - [`HandlerPool`] / [`TaskSet`] - background mode execution
//! - [`RuntimeConfig`] and [`init_logging`] - configuration and logs
//!
//! # How it fits
//! `weft-core` decodes input, `weft-layout` builds and paints the tree, and
//! `weft-render` turns frames into bytes. Nothing here talks to a terminal
//! device directly: [`Session::run`] takes any reader, writer and size
//! source.

pub mod config;
pub mod focus;
pub mod handlers;
pub mod hover;
pub mod logging;
pub mod pool;
pub mod session;
pub mod tasks;

pub use config::RuntimeConfig;
pub use focus::{FocusManager, FocusSnapshot};
pub use handlers::{
    DispatchEvent, DispatchOutcome, DispatchTicket, EventType, Handler, HandlerError, HandlerId,
    HandlerRegistry, HandlerResult, Payload, Scope,
};
pub use hover::HoverManager;
pub use logging::{LogConfig, LogFormat, LogTarget, LoggingError, init_logging};
pub use pool::{HandlerPool, PoolError};
pub use session::{QuitHandle, Session, SessionError, StateListener, View};
pub use tasks::{TaskReport, TaskSet};
