//! Error types for the batch driver
//!
//! Unit errors stay inside one file or record and end up in the run
//! report. Batch errors stop the run before any unit starts.

use renamer_core::ReassembleError;
use renamer_java::SpanError;
use renamer_llm::GeneratorError;
use std::path::PathBuf;

/// Failure confined to one unit of work
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    /// Input file does not exist
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Input could not be read
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be produced
    #[error(transparent)]
    Reassemble(#[from] ReassembleError),

    /// Worker has no usable generator client
    #[error("generator unavailable: {0}")]
    Generator(#[from] GeneratorError),

    /// Unit code panicked
    #[error("unit panicked: {0}")]
    Panicked(String),
}

impl UnitError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SpanError> for UnitError {
    fn from(err: SpanError) -> Self {
        match err {
            SpanError::NotFound { path } => Self::NotFound { path },
            SpanError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Failure that prevents a run from starting or finishing
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Input path does not exist
    #[error("input not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Directory listing or report write failed
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be serialized
    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Report could not be written
    #[error(transparent)]
    Report(#[from] ReassembleError),
}

impl BatchError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Invalid or unreadable configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected keys
    #[error("invalid config {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Environment override could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    /// Value out of range
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Logging could not be installed
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Log file could not be opened
    #[error("cannot open log file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already set
    #[error("logging already initialized: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_errors_keep_their_kind() {
        let unit: UnitError = SpanError::not_found("A.java").into();
        assert!(matches!(unit, UnitError::NotFound { .. }));
        assert_eq!(unit.to_string(), "file not found: A.java");
    }

    #[test]
    fn reassembly_errors_are_transparent() {
        let unit: UnitError = ReassembleError::SpanNotFound {
            name: "test0".into(),
        }
        .into();
        assert_eq!(
            unit.to_string(),
            ReassembleError::SpanNotFound {
                name: "test0".into()
            }
            .to_string()
        );
    }
}
