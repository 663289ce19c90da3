//! Log setup for the binary
//!
//! Logs go to stderr and, when a log directory is given, also to
//! `<dir>/pipeline.log` without colours.

use crate::error::LoggingError;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File name of the run log
pub const LOG_FILE_NAME: &str = "pipeline.log";

/// Filter directive for a `-v` count
///
/// With no `-v`, `RUST_LOG` wins when set.
#[must_use]
pub fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global subscriber
///
/// # Errors
/// - `LoggingError::Io` if the log file cannot be opened
/// - `LoggingError::Init` if a subscriber is already installed
pub fn init_logging(verbosity: u8, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    let file_layer = match log_dir {
        Some(dir) => {
            let path = dir.join(LOG_FILE_NAME);
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| LoggingError::Io { path, source })?;
            Some(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_for(verbosity))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
