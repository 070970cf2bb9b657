#![forbid(unsafe_code)]

//! Subscriber setup for applications built on the runtime.
//!
//! Stdout belongs to the UI, so logs go to stderr or a file. The filter comes
//! from [`ENV_LOG`], then `RUST_LOG`, then [`DEFAULT_FILTER`].

use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Filter directive variable read before `RUST_LOG`.
pub const ENV_LOG: &str = "WEFT_LOG";

pub const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    #[default]
    Stderr,
    /// Appended to, created if missing.
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `weft_runtime=debug,warn`.
    pub filter: String,
    pub format: LogFormat,
    pub target: LogTarget,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            target: LogTarget::default(),
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            filter: filter_directive(get_env),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter {directive:?}: {source}")]
    Filter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("cannot open log file: {0}")]
    Io(#[from] io::Error),
    #[error("global subscriber already installed: {0}")]
    Install(String),
}

/// Resolve the filter directive: `WEFT_LOG`, else `RUST_LOG`, else `warn`.
/// Empty values are skipped.
pub fn filter_directive<F>(get_env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [ENV_LOG, "RUST_LOG"]
        .iter()
        .filter_map(|key| get_env(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global `tracing` subscriber described by `config`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|source| LoggingError::Filter {
        directive: config.filter.clone(),
        source,
    })?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match (&config.target, config.format) {
        (LogTarget::Stderr, LogFormat::Compact) => {
            builder.compact().with_writer(io::stderr).try_init()
        }
        (LogTarget::Stderr, LogFormat::Json) => builder.json().with_writer(io::stderr).try_init(),
        (LogTarget::File(path), format) => {
            let file = Mutex::new(open_log_file(path)?);
            let builder = builder.with_ansi(false);
            match format {
                LogFormat::Compact => builder.compact().with_writer(file).try_init(),
                LogFormat::Json => builder.json().with_writer(file).try_init(),
            }
        }
    };
    installed.map_err(|err| LoggingError::Install(err.to_string()))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
