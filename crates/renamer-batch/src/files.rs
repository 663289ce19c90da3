//! Input discovery

use crate::error::BatchError;
use std::path::{Path, PathBuf};

/// Regular files in `dir` with extension `ext`, sorted by path
///
/// Not recursive. The extension is matched without its dot and ignoring
/// case.
///
/// # Errors
/// - `BatchError::NotFound` if `dir` does not exist
/// - `BatchError::Io` if it cannot be listed
pub fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| BatchError::io_error(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BatchError::io_error(dir, e))?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    tracing::debug!(dir = %dir.display(), ext, count = files.len(), "listed inputs");
    Ok(files)
}
