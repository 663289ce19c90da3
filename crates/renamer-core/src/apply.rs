//! Position-exact application of identifier mappings

use crate::mapping::IdentifierMapping;
use renamer_java::{tokenize, LexError};

/// One replacement at a byte offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEdit {
    /// Byte offset of `old` in the pre-edit text
    pub offset: usize,
    /// Text expected at `offset`
    pub old: String,
    /// Replacement
    pub new: String,
}

/// Byte offset at which each line starts
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Apply edits from the highest offset down
///
/// Each edit is checked against the text at its offset first; a mismatch
/// skips that edit alone. Returns the edited text and the number skipped.
#[must_use]
pub fn apply_edits(text: &str, mut edits: Vec<RenameEdit>) -> (String, usize) {
    edits.sort_by(|a, b| b.offset.cmp(&a.offset));

    let mut out = text.to_string();
    let mut skipped = 0;
    for edit in edits {
        let end = edit.offset + edit.old.len();
        if out.get(edit.offset..end) != Some(edit.old.as_str()) {
            tracing::warn!(
                offset = edit.offset,
                expected = %edit.old,
                "text at offset does not match, skipping replacement"
            );
            skipped += 1;
            continue;
        }
        out.replace_range(edit.offset..end, &edit.new);
    }
    (out, skipped)
}

/// Rename every identifier token that is a mapping key
///
/// # Errors
/// - `LexError` if `code` cannot be tokenized
pub fn apply_mapping(code: &str, mapping: &IdentifierMapping) -> Result<String, LexError> {
    if mapping.is_empty() {
        return Ok(code.to_string());
    }

    let starts = line_starts(code);
    let edits: Vec<RenameEdit> = tokenize(code)?
        .into_iter()
        .filter(|t| t.is_identifier())
        .filter_map(|t| {
            let new = mapping.get(&t.value)?;
            let offset = starts.get(t.line)? + t.column;
            (new != t.value).then(|| RenameEdit {
                offset,
                old: t.value.clone(),
                new: new.to_string(),
            })
        })
        .collect();

    let (renamed, skipped) = apply_edits(code, edits);
    if skipped > 0 {
        tracing::warn!(skipped, "some replacements were skipped");
    }
    Ok(renamed)
}
