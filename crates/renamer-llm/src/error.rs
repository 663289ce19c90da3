//! Error types for the external collaborators
//!
//! Generator failures are all "upstream" failures: the call did not produce
//! usable text. Unusable text from a successful call is not an error here.

/// Text generator call failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// Non-success HTTP status
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Connection or protocol failure
    #[error("generator request failed: {0}")]
    Transport(String),

    /// Call exceeded the configured timeout
    #[error("generator request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// 2xx response without the expected content
    #[error("unexpected generator payload: {0}")]
    InvalidPayload(String),

    /// Client could not be constructed
    #[error("generator client setup failed: {0}")]
    Setup(String),
}

impl GeneratorError {
    /// Whether the call ran out of time
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { secs: timeout_secs }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Readability scorer failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScorerError {
    /// Scorer service returned a non-success status
    #[error("scorer returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Connection, timeout or protocol failure
    #[error("scorer request failed: {0}")]
    Transport(String),

    /// Scorer output held no average
    #[error("scorer output has no average: {0:?}")]
    UnparseableOutput(String),
}

/// Keep error bodies short in logs and reports
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX_BODY_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_CHARS {
        trimmed.to_string()
    } else {
        let mut out: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
        out.push_str("...");
        out
    }
}
