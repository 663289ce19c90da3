//! Error types for Java syntax handling
//!
//! Covers the failure modes of the syntax capability:
//! - Missing source files (span extraction)
//! - Lexical failures (tokenizing)
//! - Syntax failures (parsing)
//! - Unresolvable test-method selection (candidate extraction)

use std::path::PathBuf;

/// Errors while reading test spans from a file
#[derive(Debug, thiserror::Error)]
pub enum SpanError {
    /// Source file does not exist
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Source file exists but could not be read
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpanError {
    /// Create not-found error for path
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Tokenizer failure on malformed input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// Grammar could not be loaded into the parser
    #[error("java grammar unavailable: {0}")]
    Grammar(String),

    /// Parser produced no tree at all
    #[error("tokenizer produced no output")]
    NoTree,

    /// Input contains text that is not a Java token
    #[error("unrecognized input at line {line}, column {column}: {snippet:?}")]
    Unrecognized {
        line: usize,
        column: usize,
        snippet: String,
    },
}

/// Parser failure on malformed input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Grammar could not be loaded into the parser
    #[error("java grammar unavailable: {0}")]
    Grammar(String),

    /// Parser produced no tree at all
    #[error("parser produced no output")]
    NoTree,

    /// Syntax error in source
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },
}

/// Why rename candidates could not be computed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateError {
    /// Wrapped source did not parse
    #[error("candidate extraction failed: {0}")]
    Parse(#[from] ParseError),

    /// Several methods, none carrying a test annotation
    #[error("cannot choose test method among {methods} candidates")]
    Ambiguous { methods: usize },
}
