//! Lexical proof that a rewrite only renamed identifiers
//!
//! Both sides are tokenized and every identifier is replaced by the index of
//! its first appearance. The rewrite passes iff the two normalized streams
//! are equal element for element. Any change to a keyword, literal,
//! operator, separator or comment, or any insertion, deletion or reordering
//! of tokens, makes the streams differ.

use crate::error::Divergence;
use renamer_java::{tokenize, Token, TokenKind};
use std::collections::HashMap;
use std::fmt;

/// Token with identifier spelling abstracted away
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedToken {
    /// n-th distinct identifier of the stream
    Identifier(usize),
    /// Any other token, compared by kind and exact text
    Other(TokenKind, String),
}

impl fmt::Display for NormalizedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(index) => write!(f, "ID{index}"),
            Self::Other(kind, value) => write!(f, "{kind:?}({value:?})"),
        }
    }
}

/// Replace identifiers by first-seen indices
#[must_use]
pub fn normalize(tokens: &[Token]) -> Vec<NormalizedToken> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    tokens
        .iter()
        .map(|token| {
            if token.is_identifier() {
                let next = seen.len();
                NormalizedToken::Identifier(*seen.entry(token.value.as_str()).or_insert(next))
            } else {
                NormalizedToken::Other(token.kind, token.value.clone())
            }
        })
        .collect()
}

/// Check that `candidate` differs from `original` only in identifier names
///
/// # Errors
/// - `Divergence` describing the first difference, or the side that failed
///   to tokenize
pub fn check_only_renames(original: &str, candidate: &str) -> Result<(), Divergence> {
    let lex = |side: &'static str, code: &str| {
        tokenize(code).map_err(|error| Divergence::Unlexable { side, error })
    };
    let original = normalize(&lex("original", original)?);
    let candidate = normalize(&lex("rewritten", candidate)?);

    if let Some(index) = original
        .iter()
        .zip(&candidate)
        .position(|(a, b)| a != b)
    {
        return Err(Divergence::Token {
            index,
            expected: original[index].to_string(),
            found: candidate[index].to_string(),
        });
    }
    if original.len() != candidate.len() {
        return Err(Divergence::Length {
            original: original.len(),
            candidate: candidate.len(),
        });
    }
    Ok(())
}

/// Boolean form of [`check_only_renames`]; tokenizer failures count as `false`
#[must_use]
pub fn only_renames(original: &str, candidate: &str) -> bool {
    check_only_renames(original, candidate).is_ok()
}

/// Unified line diff for logging rejected rewrites
#[must_use]
pub fn unified_diff(original: &str, candidate: &str) -> String {
    similar::TextDiff::from_lines(original, candidate)
        .unified_diff()
        .context_radius(2)
        .header("original", "rewritten")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNC_1: &str = "@Test public void func_1(){ int var_1 = 2; assertEquals(2, var_1); }";

    #[test]
    fn pure_rename_passes() {
        let renamed = "@Test public void testAddsTwo(){ int result = 2; assertEquals(2, result); }";
        assert!(only_renames(FUNC_1, renamed));
    }

    #[test]
    fn literal_change_fails() {
        let changed = "@Test public void testAddsTwo(){ int result = 2; assertEquals(3, result); }";
        let err = check_only_renames(FUNC_1, changed).unwrap_err();
        assert!(matches!(err, Divergence::Token { .. }));
        assert!(!only_renames(FUNC_1, changed));
    }

    #[test]
    fn merging_two_names_fails() {
        let original = "int a = 1; int b = a;";
        let merged = "int x = 1; int x = x;";
        assert!(!only_renames(original, merged));
    }

    #[test]
    fn swapping_names_consistently_passes() {
        assert!(only_renames("int a = b;", "int b = a;"));
    }

    #[test]
    fn comment_change_fails() {
        assert!(!only_renames("int a = 1; // one", "int b = 1; // two"));
    }

    #[test]
    fn appended_token_is_length_divergence() {
        assert_eq!(
            check_only_renames("f(a)", "f(a);"),
            Err(Divergence::Length {
                original: 4,
                candidate: 5
            })
        );
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!(only_renames("int a=1;", "int  b =\n 1;"));
    }

    #[test]
    fn unlexable_side_fails_closed() {
        assert!(!only_renames("int a = 1;", "int a = `1;"));
        assert!(matches!(
            check_only_renames("int a = `1;", "int a = 1;"),
            Err(Divergence::Unlexable { side: "original", .. })
        ));
    }

    #[test]
    fn keyword_as_new_name_fails() {
        assert!(!only_renames("int var_1 = 2;", "int int = 2;"));
        assert!(!only_renames(
            "int a = 2; return a;",
            "int class = 2; return class;"
        ));
        assert!(!only_renames("boolean a = b;", "boolean a = true;"));
    }

    #[test]
    fn diff_mentions_changed_lines() {
        let diff = unified_diff("a\nb\n", "a\nc\n");
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }
}
