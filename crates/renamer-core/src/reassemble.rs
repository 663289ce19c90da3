//! Merging accepted rewrites back into their file

use crate::error::ReassembleError;
use crate::types::TestCase;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Substitute every clean rewrite into `source`
///
/// The first occurrence of each trimmed original is replaced by the trimmed
/// rewrite. Unclean cases are skipped, as are clean cases with an empty
/// rewrite.
///
/// # Errors
/// - `ReassembleError::SpanNotFound` if an original is no longer in the text
pub fn reassemble(source: &str, cases: &[TestCase]) -> Result<String, ReassembleError> {
    let mut merged = source.to_string();
    for case in cases.iter().filter(|c| c.is_clean()) {
        let replacement = case.code().trim();
        if replacement.is_empty() {
            tracing::warn!(method = case.name(), "refusing to substitute empty rewrite");
            continue;
        }
        let original = case.original_code().trim();
        let Some(at) = merged.find(original) else {
            return Err(ReassembleError::SpanNotFound {
                name: case.name().to_string(),
            });
        };
        merged.replace_range(at..at + original.len(), replacement);
    }
    Ok(merged)
}

/// Write `contents` to `path`, creating parent directories
///
/// # Errors
/// - `ReassembleError::AlreadyExists` if `path` exists and `overwrite` is false
/// - `ReassembleError::Io` on any other write failure
pub fn write_output(path: &Path, contents: &str, overwrite: bool) -> Result<(), ReassembleError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReassembleError::io_error(parent, e))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => ReassembleError::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => ReassembleError::io_error(path, e),
    })?;
    file.write_all(contents.as_bytes())
        .map_err(|e| ReassembleError::io_error(path, e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}
