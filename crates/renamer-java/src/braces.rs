//! Brace-depth counting that ignores braces inside literals and comments

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexical {
    Code,
    LineComment,
    BlockComment,
    Str,
    Char,
    TextBlock,
}

/// Incremental brace counter
///
/// Feed text line by line (or all at once); the counter reports the byte
/// index at which depth returns to zero after at least one `{` was seen.
/// Block comments and text blocks carry over between feeds, string and
/// char literals do not.
#[derive(Debug, Clone)]
pub(crate) struct BraceCounter {
    depth: i64,
    opened: bool,
    state: Lexical,
}

impl BraceCounter {
    pub(crate) fn new() -> Self {
        Self {
            depth: 0,
            opened: false,
            state: Lexical::Code,
        }
    }

    /// Consume `text`; `Some(index)` of the balancing `}` if reached
    pub(crate) fn feed(&mut self, text: &str) -> Option<usize> {
        if matches!(self.state, Lexical::LineComment | Lexical::Str | Lexical::Char) {
            self.state = Lexical::Code;
        }

        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match self.state {
                Lexical::Code => match b {
                    b'/' if next == Some(b'/') => {
                        self.state = Lexical::LineComment;
                        i += 1;
                    }
                    b'/' if next == Some(b'*') => {
                        self.state = Lexical::BlockComment;
                        i += 1;
                    }
                    b'"' if text[i..].starts_with("\"\"\"") => {
                        self.state = Lexical::TextBlock;
                        i += 2;
                    }
                    b'"' => self.state = Lexical::Str,
                    b'\'' => self.state = Lexical::Char,
                    b'{' => {
                        self.depth += 1;
                        self.opened = true;
                    }
                    b'}' => {
                        self.depth -= 1;
                        if self.opened && self.depth <= 0 {
                            return Some(i);
                        }
                    }
                    _ => {}
                },
                Lexical::LineComment => {
                    if b == b'\n' {
                        self.state = Lexical::Code;
                    }
                }
                Lexical::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        self.state = Lexical::Code;
                        i += 1;
                    }
                }
                Lexical::Str | Lexical::Char => {
                    let close = if self.state == Lexical::Str { b'"' } else { b'\'' };
                    if b == b'\\' {
                        i += 1;
                    } else if b == close || b == b'\n' {
                        self.state = Lexical::Code;
                    }
                }
                Lexical::TextBlock => {
                    if b == b'\\' {
                        i += 1;
                    } else if text[i..].starts_with("\"\"\"") {
                        self.state = Lexical::Code;
                        i += 2;
                    }
                }
            }
            i += 1;
        }
        None
    }
}

/// Index of the `}` balancing the `{` at `open`
pub(crate) fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let tail = text.get(open..)?;
    if !tail.starts_with('{') {
        return None;
    }
    BraceCounter::new().feed(tail).map(|i| open + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_braces_in_literals_and_comments() {
        let text = r#"{ String s = "}"; char c = '}'; // }
            /* } */ }"#;
        let close = matching_brace(text, 0).unwrap();
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn block_comment_spans_lines() {
        let mut counter = BraceCounter::new();
        assert_eq!(counter.feed("void f() { /* start"), None);
        assert_eq!(counter.feed("   } still comment */"), None);
        assert_eq!(counter.feed("}"), Some(0));
    }

    #[test]
    fn unbalanced_returns_none() {
        assert_eq!(matching_brace("{ { }", 0), None);
    }
}
