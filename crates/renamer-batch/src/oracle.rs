//! Oracle records for eval mode
//!
//! A `.jsonl` file holds one JSON object per line with the obfuscated test
//! in `prompt` and the human-named ground truth in `response`. Lines that
//! do not fit are skipped with a warning rather than failing the file.

use crate::error::UnitError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One prompt/ground-truth pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OracleRecord {
    /// `<file name>:<line number>`
    pub id: String,
    /// Obfuscated test method
    pub prompt: String,
    /// Expected rename
    pub response: String,
}

#[derive(Deserialize)]
struct RawRecord {
    prompt: Option<String>,
    response: Option<String>,
}

/// Parse the lines of one oracle file
///
/// Line numbers in ids are 1-based.
#[must_use]
pub fn parse_oracle_lines(file_name: &str, contents: &str) -> Vec<OracleRecord> {
    let mut records = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawRecord = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(file = file_name, line = line_no, error = %e, "skipping malformed oracle line");
                continue;
            }
        };
        let (Some(prompt), Some(response)) = (raw.prompt, raw.response) else {
            tracing::warn!(file = file_name, line = line_no, "skipping oracle line without prompt and response");
            continue;
        };
        records.push(OracleRecord {
            id: format!("{file_name}:{line_no}"),
            prompt,
            response,
        });
    }
    records
}

/// Read and parse one oracle file
///
/// # Errors
/// - `UnitError::NotFound` or `UnitError::Io` if the file cannot be read
pub fn load_oracle_file(path: &Path) -> Result<Vec<OracleRecord>, UnitError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => UnitError::NotFound {
            path: path.to_path_buf(),
        },
        _ => UnitError::io_error(path, e),
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let records = parse_oracle_lines(&file_name, &contents);
    tracing::debug!(file = %file_name, records = records.len(), "loaded oracle file");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skips_bad_lines_and_numbers_from_one() {
        let contents = concat!(
            r#"{"prompt": "p1", "response": "r1"}"#,
            "\n\n",
            "not json\n",
            r#"{"prompt": "p2"}"#,
            "\n",
            r#"{"prompt": "p3", "response": "r3", "extra": 1}"#,
            "\n",
        );
        let records = parse_oracle_lines("a.jsonl", contents);
        assert_eq!(
            records,
            vec![
                OracleRecord {
                    id: "a.jsonl:1".into(),
                    prompt: "p1".into(),
                    response: "r1".into(),
                },
                OracleRecord {
                    id: "a.jsonl:5".into(),
                    prompt: "p3".into(),
                    response: "r3".into(),
                },
            ]
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_oracle_file(&dir.path().join("none.jsonl")),
            Err(UnitError::NotFound { .. })
        ));
    }
}
