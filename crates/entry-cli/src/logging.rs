//! Logging setup.
//!
//! Library code only emits `tracing` events. The binary builds a
//! [`LogConfig`] from its flags and installs the subscriber once.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogInitError {
    /// The log file could not be opened.
    #[error("cannot open log file {path}: {source}")]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("cannot install subscriber: {0}")]
    Install(String),
}

/// Where and how much to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Append to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[must_use]
    pub const fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Installs the global subscriber described by `config`.
///
/// Output goes to stderr so it never mixes with the relayed shell output on
/// stdout.
pub fn init(config: &LogConfig) -> Result<(), LogInitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(false);

    let result = match &config.file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };

    result.map_err(|e| LogInitError::Install(e.to_string()))
}

fn open_log_file(path: &Path) -> Result<File, LogInitError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogInitError::Open {
            path: path.to_path_buf(),
            source,
        })
}
