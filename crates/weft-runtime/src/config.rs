#![forbid(unsafe_code)]

//! Session configuration.
//!
//! # Environment overrides
//!
//! | Variable | Field | Format |
//! |---|---|---|
//! | `WEFT_DOUBLE_CLICK_MS` | `click.double_click_threshold` | milliseconds |
//! | `WEFT_DOUBLE_CLICK_DISTANCE` | `click.double_click_distance` | cells |
//! | `WEFT_ESCAPE_TIMEOUT_MS` | `escape_timeout` | milliseconds |
//! | `WEFT_MOUSE` | `mouse` | boolean |
//! | `WEFT_ALT_SCREEN` | `alt_screen` | boolean |
//! | `WEFT_BACKGROUND_WORKERS` | `background_workers` | count, `0` = synchronous |
//! | `WEFT_LOG` | `log.filter` | `EnvFilter` directive |
//!
//! Booleans accept `1/true/yes/on` and `0/false/no/off`. Unparseable values
//! are ignored with a warning.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use weft_core::capabilities::{DetectInputs, TerminalCapabilities};
use weft_core::click::ClickConfig;

use crate::logging::LogConfig;

pub const ENV_DOUBLE_CLICK_MS: &str = "WEFT_DOUBLE_CLICK_MS";
pub const ENV_DOUBLE_CLICK_DISTANCE: &str = "WEFT_DOUBLE_CLICK_DISTANCE";
pub const ENV_ESCAPE_TIMEOUT_MS: &str = "WEFT_ESCAPE_TIMEOUT_MS";
pub const ENV_MOUSE: &str = "WEFT_MOUSE";
pub const ENV_ALT_SCREEN: &str = "WEFT_ALT_SCREEN";
pub const ENV_BACKGROUND_WORKERS: &str = "WEFT_BACKGROUND_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub click: ClickConfig,

    /// How long a trailing ESC waits for the rest of a sequence before it
    /// is taken as the escape key.
    /// Default: 50ms
    pub escape_timeout: Duration,

    /// Enable mouse reporting.
    /// Default: true
    pub mouse: bool,

    /// Draw on the alternate screen.
    /// Default: true
    pub alt_screen: bool,

    /// Enable bracketed paste.
    /// Default: true
    pub bracketed_paste: bool,

    /// Handler worker threads. Zero dispatches synchronously on the loop
    /// thread.
    /// Default: 0
    pub background_workers: usize,

    /// Default: [`TerminalCapabilities::basic`]
    pub capabilities: TerminalCapabilities,

    pub log: LogConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            click: ClickConfig::default(),
            escape_timeout: Duration::from_millis(50),
            mouse: true,
            alt_screen: true,
            bracketed_paste: true,
            background_workers: 0,
            capabilities: TerminalCapabilities::basic(),
            log: LogConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, capabilities detected from and overrides read from the
    /// process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            capabilities: TerminalCapabilities::detect_from_inputs(&DetectInputs::from_env_with(
                &get_env,
            )),
            log: LogConfig::from_env_with(&get_env),
            ..Self::default()
        };
        if let Some(ms) = env_parse::<u64, _>(&get_env, ENV_DOUBLE_CLICK_MS) {
            config.click.double_click_threshold = Duration::from_millis(ms);
        }
        if let Some(cells) = env_parse(&get_env, ENV_DOUBLE_CLICK_DISTANCE) {
            config.click.double_click_distance = cells;
        }
        if let Some(ms) = env_parse::<u64, _>(&get_env, ENV_ESCAPE_TIMEOUT_MS) {
            config.escape_timeout = Duration::from_millis(ms);
        }
        if let Some(mouse) = env_override_bool(&get_env, ENV_MOUSE) {
            config.mouse = mouse;
        }
        if let Some(alt) = env_override_bool(&get_env, ENV_ALT_SCREEN) {
            config.alt_screen = alt;
        }
        if let Some(workers) = env_parse(&get_env, ENV_BACKGROUND_WORKERS) {
            config.background_workers = workers;
        }
        config
    }

    #[must_use]
    pub fn click(mut self, click: ClickConfig) -> Self {
        self.click = click;
        self
    }

    #[must_use]
    pub fn escape_timeout(mut self, timeout: Duration) -> Self {
        self.escape_timeout = timeout;
        self
    }

    #[must_use]
    pub fn mouse(mut self, enabled: bool) -> Self {
        self.mouse = enabled;
        self
    }

    #[must_use]
    pub fn alt_screen(mut self, enabled: bool) -> Self {
        self.alt_screen = enabled;
        self
    }

    #[must_use]
    pub fn bracketed_paste(mut self, enabled: bool) -> Self {
        self.bracketed_paste = enabled;
        self
    }

    #[must_use]
    pub fn background_workers(mut self, workers: usize) -> Self {
        self.background_workers = workers;
        self
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: TerminalCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn is_background(&self) -> bool {
        self.background_workers > 0
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_override_bool<F>(get_env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let value = get_env(key)?;
    let parsed = parse_bool(&value);
    if parsed.is_none() {
        warn!(key, value = %value, "ignoring non-boolean override");
    }
    parsed
}

fn env_parse<T, F>(get_env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = get_env(key)?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value = %value, "ignoring unparseable override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert!(config.mouse && config.alt_screen && config.bracketed_paste);
        assert!(!config.is_background());
        assert_eq!(config.click.double_click_distance, 2);
        assert_eq!(config.escape_timeout, Duration::from_millis(50));
        assert_eq!(config.capabilities, TerminalCapabilities::basic());
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let config = RuntimeConfig::from_env_with(env_of(&[]));
        assert_eq!(config.click, ClickConfig::default());
        assert!(config.mouse);
        assert_eq!(config.background_workers, 0);
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn overrides_apply() {
        let config = RuntimeConfig::from_env_with(env_of(&[
            ("WEFT_DOUBLE_CLICK_MS", "250"),
            ("WEFT_DOUBLE_CLICK_DISTANCE", "4"),
            ("WEFT_ESCAPE_TIMEOUT_MS", "10"),
            ("WEFT_MOUSE", "off"),
            ("WEFT_ALT_SCREEN", "No"),
            ("WEFT_BACKGROUND_WORKERS", " 3 "),
            ("WEFT_LOG", "weft_runtime=debug"),
        ]));
        assert_eq!(config.click.double_click_threshold, Duration::from_millis(250));
        assert_eq!(config.click.double_click_distance, 4);
        assert_eq!(config.escape_timeout, Duration::from_millis(10));
        assert!(!config.mouse);
        assert!(!config.alt_screen);
        assert_eq!(config.background_workers, 3);
        assert!(config.is_background());
        assert_eq!(config.log.filter, "weft_runtime=debug");
    }

    #[test]
    fn garbage_is_ignored() {
        let config = RuntimeConfig::from_env_with(env_of(&[
            ("WEFT_DOUBLE_CLICK_MS", "soon"),
            ("WEFT_MOUSE", "maybe"),
            ("WEFT_BACKGROUND_WORKERS", "-1"),
        ]));
        assert_eq!(config.click, ClickConfig::default());
        assert!(config.mouse);
        assert_eq!(config.background_workers, 0);
    }

    #[test]
    fn capabilities_follow_env() {
        let config = RuntimeConfig::from_env_with(env_of(&[
            ("TERM", "xterm-256color"),
            ("LANG", "en_US.UTF-8"),
            ("COLORTERM", "truecolor"),
        ]));
        assert!(config.capabilities.unicode);
        assert!(config.capabilities.true_color);
    }

    #[test]
    fn parse_bool_variants() {
        for yes in ["1", "true", "YES", " on "] {
            assert_eq!(parse_bool(yes), Some(true));
        }
        for no in ["0", "False", "no", "OFF"] {
            assert_eq!(parse_bool(no), Some(false));
        }
        assert_eq!(parse_bool("2"), None);
    }
}
