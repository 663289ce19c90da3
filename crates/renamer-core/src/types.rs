//! Result of renaming one test method

use serde::Serialize;

/// One test method and the outcome of renaming it
///
/// Created once per method by the orchestrator and never changed after.
/// `clean == false` means the original must be kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    name: String,
    original_code: String,
    code: String,
    clean: bool,
    new_name: Option<String>,
    attempts: usize,
    failure: Option<String>,
}

impl TestCase {
    /// Accepted rewrite
    #[must_use]
    pub fn accepted(
        name: impl Into<String>,
        original_code: impl Into<String>,
        code: impl Into<String>,
        new_name: Option<String>,
        attempts: usize,
    ) -> Self {
        Self {
            name: name.into(),
            original_code: original_code.into(),
            code: code.into(),
            clean: true,
            new_name,
            attempts,
            failure: None,
        }
    }

    /// Method left as it was, with the reason
    #[must_use]
    pub fn unchanged(
        name: impl Into<String>,
        original_code: impl Into<String>,
        attempts: usize,
        failure: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            original_code: original_code.into(),
            code: String::new(),
            clean: false,
            new_name: None,
            attempts,
            failure: Some(failure.into()),
        }
    }

    /// Method name as found in the source
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verbatim method text as first read
    #[inline]
    #[must_use]
    pub fn original_code(&self) -> &str {
        &self.original_code
    }

    /// Accepted rewrite; empty unless clean
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the rewrite passed validation
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    /// New method name chosen by the model
    #[inline]
    #[must_use]
    pub fn new_name(&self) -> Option<&str> {
        self.new_name.as_deref()
    }

    /// Generator calls made
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Why the method was left unchanged
    #[inline]
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}
