//! Renamer Java - syntax capability for the rename pipeline
//!
//! Everything the pipeline needs to know about Java source:
//! - Locating `@Test` methods in a file ([`extract_spans`])
//! - Wrapping a method in a synthetic class and recovering it ([`wrap`], [`unwrap`])
//! - Lossless tokenizing ([`tokenize`]) and error-checked parsing ([`parse`])
//! - Rename candidates of a wrapped method ([`extract_candidates`])
//!
//! # Example
//!
//! ```rust
//! use renamer_java::{extract_candidates, wrap};
//!
//! let wrapped = wrap(&["@Test", "public void func_1() {", "  int var_1 = 2;", "}"]);
//! let candidates = extract_candidates(&wrapped).unwrap();
//! assert!(candidates.contains("var_1"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod braces;
pub mod candidates;
pub mod error;
pub mod spans;
pub mod syntax;
pub mod wrap;

pub use candidates::{extract_candidates, is_constant_like, CandidateSet};
pub use error::{CandidateError, LexError, ParseError, SpanError};
pub use spans::{declared_method_name, extract_spans, extract_spans_from_file, TestSpan};
pub use syntax::{parse, tokenize, SyntaxTree, Token, TokenKind};
pub use wrap::{unwrap, wrap, WRAPPER_CLASS_NAME};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Java sources
    pub use crate::{
        extract_candidates, extract_spans_from_file, tokenize, unwrap, wrap, CandidateSet,
        TestSpan, Token, TokenKind,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
