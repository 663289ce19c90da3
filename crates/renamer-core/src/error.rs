//! Error types for the rename pipeline
//!
//! Provides:
//! - [`AttemptError`]: why one rename attempt was rejected
//! - [`Divergence`]: how a rewrite differs beyond identifier spelling
//! - [`ReassembleError`]: consistency failures when writing a file back
//! - [`TransitionError`]: illegal orchestrator state changes

use crate::state::Phase;
use renamer_java::LexError;
use renamer_llm::GeneratorError;
use std::path::PathBuf;

/// Rejection of a single rename attempt
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttemptError {
    /// Generator call failed
    #[error("generator call failed: {0}")]
    Upstream(#[from] GeneratorError),

    /// Response is not JSON
    #[error("response is not valid JSON: {reason}")]
    MalformedResponse { reason: String },

    /// Response is JSON but not a flat string-to-string object
    #[error("response is not a flat name mapping: {reason}")]
    WrongShape { reason: String },

    /// Response omitted required identifiers
    #[error("mapping is missing identifiers: {}", .missing.join(", "))]
    MissingIdentifiers { missing: Vec<String> },

    /// Applying the mapping changed more than identifiers
    #[error("rewrite changed more than identifier names: {0}")]
    InvariantViolation(#[from] Divergence),

    /// Original method cannot be tokenized, so no mapping can ever be applied
    #[error("original code cannot be tokenized: {0}")]
    Unlexable(LexError),
}

impl AttemptError {
    /// Whether the failure is retried at the cost of one attempt
    ///
    /// `false` means no later attempt can succeed either.
    #[inline]
    #[must_use]
    pub fn consumes_attempt(&self) -> bool {
        !matches!(self, Self::Unlexable(_))
    }
}

/// First point where a rewrite stops being a pure rename
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Divergence {
    /// One side failed to tokenize
    #[error("{side} code cannot be tokenized: {error}")]
    Unlexable { side: &'static str, error: LexError },

    /// Token streams differ at `index`
    #[error("token {index} differs: expected {expected}, found {found}")]
    Token {
        index: usize,
        expected: String,
        found: String,
    },

    /// One stream is a strict prefix of the other
    #[error("token count differs: {original} original vs {candidate} rewritten")]
    Length { original: usize, candidate: usize },
}

/// Failure merging rewrites into a file or writing it out
#[derive(Debug, thiserror::Error)]
pub enum ReassembleError {
    /// Original method text no longer present in the file
    #[error("original text of {name} not found in file")]
    SpanNotFound { name: String },

    /// Output exists and overwriting was not requested
    #[error("output already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    /// Output could not be written
    #[error("io error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReassembleError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Orchestrator attempted a transition its state machine forbids
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}
