//! Test-method span extraction
//!
//! Line-oriented scan for `@Test` methods. Spans are found in file order and
//! never overlap: scanning resumes on the line after each method's closing
//! brace.

use crate::braces::BraceCounter;
use crate::error::SpanError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};

static TEST_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(?:[\w.]*\.)?Test\b").expect("valid regex"));

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*(?:@[\w.]+(?:\([^)]*\))?\s*)*",
        r"(?:(?:public|protected|private|static|final|synchronized|abstract|native|strictfp|default)\s+)*",
        r"(?:<[^>]*>\s*)?",
        r"[\w.$]+(?:<[^()]*>)?(?:\[\])*\s+",
        r"([A-Za-z_$][\w$]*)\s*\(",
    ))
    .expect("valid regex")
});

/// One test method located in a source file
///
/// Line indices are 0-based. `end_line_index` is the line holding the
/// closing brace, so the method occupies `start_line_index..=end_line_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSpan {
    /// Method name from the signature
    pub name: String,
    /// Line of the test annotation
    pub annotation_line_index: usize,
    /// Line of the method signature
    pub signature_line_index: usize,
    /// First line of the span (the annotation line)
    pub start_line_index: usize,
    /// Line of the closing brace
    pub end_line_index: usize,
    /// File the span was read from
    pub source_file_path: PathBuf,
}

impl TestSpan {
    /// Half-open line range covered by the method
    #[inline]
    #[must_use]
    pub fn line_range(&self) -> Range<usize> {
        self.start_line_index..self.end_line_index + 1
    }

    /// Verbatim text of the span within `source`
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        let lines = SourceLines::new(source);
        lines.slice(self.line_range())
    }
}

/// Byte layout of a source's lines, keeping `\r` out of line contents
struct SourceLines<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> SourceLines<'a> {
    fn new(source: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        if source.ends_with('\n') {
            starts.pop();
        }
        Self { source, starts }
    }

    fn len(&self) -> usize {
        if self.source.is_empty() {
            0
        } else {
            self.starts.len()
        }
    }

    fn line(&self, index: usize) -> &'a str {
        let start = self.starts[index];
        let end = self
            .starts
            .get(index + 1)
            .map_or(self.source.len(), |next| next - 1);
        let raw = &self.source[start..end];
        let raw = raw.strip_suffix('\n').unwrap_or(raw);
        raw.strip_suffix('\r').unwrap_or(raw)
    }

    fn slice(&self, range: Range<usize>) -> &'a str {
        let end_line = range.end.min(self.len());
        if range.start >= end_line {
            return "";
        }
        let start = self.starts[range.start];
        let last = self.line(end_line - 1);
        let end = self.starts[end_line - 1] + last.len();
        &self.source[start..end]
    }
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

/// Method name declared on a signature line, with the byte offset after `(`
fn signature(line: &str) -> Option<(String, usize)> {
    let caps = SIGNATURE.captures(line)?;
    let name = caps.get(1)?.as_str();
    if matches!(name, "if" | "for" | "while" | "switch" | "catch" | "synchronized") {
        return None;
    }
    Some((name.to_string(), caps.get(0)?.end()))
}

/// Signature of the method following the annotation on line `annotation`
fn find_signature(lines: &SourceLines<'_>, annotation: usize) -> Option<(usize, String, usize)> {
    if let Some((name, at)) = signature(lines.line(annotation)) {
        return Some((annotation, name, at));
    }

    for index in annotation + 1..lines.len() {
        let line = lines.line(index);
        if let Some((name, at)) = signature(line) {
            return Some((index, name, at));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) || trimmed.starts_with('@') {
            continue;
        }
        return None;
    }
    None
}

/// Line of the brace closing the method body; last line if it never closes
fn find_end(lines: &SourceLines<'_>, signature_line: usize, body_from: usize) -> usize {
    let mut counter = BraceCounter::new();
    let first = lines.line(signature_line);
    if counter.feed(first.get(body_from..).unwrap_or_default()).is_some() {
        return signature_line;
    }
    for index in signature_line + 1..lines.len() {
        if counter.feed(lines.line(index)).is_some() {
            return index;
        }
    }
    lines.len().saturating_sub(1)
}

/// Find every test method in `source`, in file order
#[must_use]
pub fn extract_spans(source: &str, path: &Path) -> Vec<TestSpan> {
    let lines = SourceLines::new(source);
    let mut spans = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = lines.line(index);
        if is_comment_line(line.trim()) || !TEST_ANNOTATION.is_match(line) {
            index += 1;
            continue;
        }

        let Some((signature_line, name, body_from)) = find_signature(&lines, index) else {
            tracing::debug!(line = index, "test annotation without method signature");
            index += 1;
            continue;
        };

        let end = find_end(&lines, signature_line, body_from);
        spans.push(TestSpan {
            name,
            annotation_line_index: index,
            signature_line_index: signature_line,
            start_line_index: index,
            end_line_index: end,
            source_file_path: path.to_path_buf(),
        });
        index = end + 1;
    }

    spans
}

/// Read a file and extract its test spans
///
/// # Errors
/// - `SpanError::NotFound` if the file does not exist
/// - `SpanError::Io` if it cannot be read as UTF-8 text
pub fn extract_spans_from_file(path: &Path) -> Result<(String, Vec<TestSpan>), SpanError> {
    if !path.exists() {
        return Err(SpanError::not_found(path));
    }
    let source = std::fs::read_to_string(path).map_err(|e| SpanError::io_error(path, e))?;
    let spans = extract_spans(&source, path);
    tracing::debug!(path = %path.display(), spans = spans.len(), "extracted test spans");
    Ok((source, spans))
}

/// Name of the first method declared in `code`
#[must_use]
pub fn declared_method_name(code: &str) -> Option<String> {
    let lines = SourceLines::new(code);
    (0..lines.len()).find_map(|i| signature(lines.line(i)).map(|(name, _)| name))
}
