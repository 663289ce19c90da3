//! Wrapping methods in a synthetic class and recovering them from model output

use crate::braces::matching_brace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Name of the synthetic class that hosts a lone test method
pub const WRAPPER_CLASS_NAME: &str = "TestClassX";

static TEST_METHOD_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"@(?:[\w.]*\.)?Test\b(?:\s*\([^)]*\))?\s*",
        r"(?:@[\w.]+(?:\s*\([^)]*\))?\s*)*",
        r"(?:(?:public|protected|private|static|final|synchronized|abstract|strictfp)\s+)*",
        r"(?:<[^>]*>\s*)?",
        r"[\w.$]+(?:<[^()]*>)?(?:\[\])*\s+[A-Za-z_$][\w$]*\s*",
        r"\([^)]*\)\s*",
        r"(?:throws\s+[\w.$]+(?:\s*,\s*[\w.$]+)*\s*)?",
        r"\{",
    ))
    .expect("valid regex")
});

/// Enclose method lines in a minimal class so they form a compilation unit
#[must_use]
pub fn wrap<S: AsRef<str>>(lines: &[S]) -> String {
    let body = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    format!("public class {WRAPPER_CLASS_NAME} {{\n{body}\n}}")
}

/// Extract the annotated test method from arbitrary text
///
/// Returns the text from the annotation through the brace that closes the
/// method body. When no such method is found the trimmed input comes back.
#[must_use]
pub fn unwrap(text: &str) -> String {
    let Some(header) = TEST_METHOD_HEADER.find(text) else {
        return text.trim().to_string();
    };
    let open = header.end() - 1;
    match matching_brace(text, open) {
        Some(close) => text[header.start()..=close].to_string(),
        None => text.trim().to_string(),
    }
}
