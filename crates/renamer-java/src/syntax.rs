//! Grammar-aware Java tokenizer and parser
//!
//! Both operations run on `tree-sitter-java`. The tokenizer is lossless:
//! every non-whitespace byte of the input ends up in exactly one token, or
//! tokenizing fails with [`LexError`].

use crate::error::{LexError, ParseError};
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser, Tree};

/// Lexical category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Any name: variables, methods, types, packages
    Identifier,
    /// Reserved words, primitive types, modifiers
    Keyword,
    /// Numbers, strings, characters, `true`/`false`/`null`
    Literal,
    /// Brackets, braces, `;`, `,`, `.`, `@`, `::`, `...`
    Separator,
    /// Everything else that is punctuation
    Operator,
    /// Line and block comments
    Comment,
}

/// One token with its 0-based line and byte column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Lexical category
    pub kind: TokenKind,
    /// Exact source text
    pub value: String,
    /// 0-based line
    pub line: usize,
    /// 0-based byte column within the line
    pub column: usize,
}

impl Token {
    /// Whether this token is a name
    #[inline]
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}

/// Nodes emitted as a single token even though tree-sitter gives them children
const ATOMIC_KINDS: &[&str] = &["string_literal", "character_literal", "text_block"];

const SEPARATORS: &[&str] = &["(", ")", "{", "}", "[", "]", ";", ",", ".", "...", "@", "::"];

const LITERAL_KINDS: &[&str] = &[
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "string_literal",
    "character_literal",
    "text_block",
    "true",
    "false",
    "null_literal",
];

/// Words the language reserves; never names even where error recovery labels them so
const RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "_",
];

const RESERVED_LITERALS: &[&str] = &["true", "false", "null"];

fn new_parser() -> Result<Parser, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| e.to_string())?;
    Ok(parser)
}

fn classify(node: Node<'_>, text: &str) -> TokenKind {
    let kind = node.kind();
    if kind == "identifier" || kind == "type_identifier" {
        if RESERVED_LITERALS.contains(&text) {
            TokenKind::Literal
        } else if RESERVED_WORDS.contains(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    } else if LITERAL_KINDS.contains(&kind) {
        TokenKind::Literal
    } else if kind == "line_comment" || kind == "block_comment" {
        TokenKind::Comment
    } else if SEPARATORS.contains(&text) {
        TokenKind::Separator
    } else if text.starts_with(|c: char| c.is_ascii_alphabetic()) {
        TokenKind::Keyword
    } else {
        TokenKind::Operator
    }
}

/// Split Java source into tokens
///
/// # Errors
/// - `LexError::Unrecognized` if any non-whitespace text is not a Java token
/// - `LexError::Grammar` / `LexError::NoTree` on parser setup failure
pub fn tokenize(code: &str) -> Result<Vec<Token>, LexError> {
    let mut parser = new_parser().map_err(LexError::Grammar)?;
    let tree = parser.parse(code, None).ok_or(LexError::NoTree)?;

    let mut tokens = Vec::new();
    let mut covered_to = 0usize;
    let mut cursor = tree.root_node().walk();

    loop {
        let node = cursor.node();
        let leaf = node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind());

        if leaf {
            if node.is_error() {
                return Err(unrecognized(code, node.start_byte()));
            }
            let (start, end) = (node.start_byte(), node.end_byte());
            let value = code.get(start..end).unwrap_or_default();
            if end > start && !node.is_missing() && !value.trim().is_empty() {
                check_gap(code, covered_to, start)?;
                let point = node.start_position();
                tokens.push(Token {
                    kind: classify(node, value),
                    value: value.to_string(),
                    line: point.row,
                    column: point.column,
                });
                covered_to = end;
            }
        } else if cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                check_gap(code, covered_to, code.len())?;
                return Ok(tokens);
            }
        }
    }
}

/// Text between two tokens must be pure whitespace
fn check_gap(code: &str, from: usize, to: usize) -> Result<(), LexError> {
    if to < from {
        return Err(unrecognized(code, to));
    }
    let gap = code.get(from..to).ok_or_else(|| unrecognized(code, from))?;
    match gap.find(|c: char| !c.is_whitespace()) {
        Some(offset) => Err(unrecognized(code, from + offset)),
        None => Ok(()),
    }
}

fn unrecognized(code: &str, byte: usize) -> LexError {
    let (line, column) = line_column(code, byte);
    let snippet = code
        .get(byte..)
        .unwrap_or_default()
        .chars()
        .take(16)
        .collect();
    LexError::Unrecognized {
        line,
        column,
        snippet,
    }
}

fn line_column(code: &str, byte: usize) -> (usize, usize) {
    let prefix = &code.as_bytes()[..byte.min(code.len())];
    let line = prefix.iter().filter(|&&b| b == b'\n').count();
    let line_start = prefix
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    (line, prefix.len() - line_start)
}

/// Error-free syntax tree together with the text it was parsed from
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    tree: Tree,
    source: String,
}

impl SyntaxTree {
    /// Root `program` node
    #[inline]
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text of a node from this tree
    #[must_use]
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
    }

    /// Parsed source
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse Java source into a syntax tree
///
/// # Errors
/// - `ParseError::Syntax` pointing at the first error or missing node
pub fn parse(code: &str) -> Result<SyntaxTree, ParseError> {
    let mut parser = new_parser().map_err(ParseError::Grammar)?;
    let tree = parser.parse(code, None).ok_or(ParseError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root).start_position();
        return Err(ParseError::Syntax {
            line: at.row,
            column: at.column,
        });
    }

    Ok(SyntaxTree {
        tree,
        source: code.to_string(),
    })
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}
