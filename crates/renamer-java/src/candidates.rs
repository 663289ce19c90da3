//! Rename candidates of a wrapped test method
//!
//! Candidates are the method's own name plus every local it declares:
//! parameters, local variables, loop variables, catch parameters, lambda
//! parameters. Constant-like names (upper case, no lower-case letters) are
//! never candidates.

use crate::error::CandidateError;
use crate::syntax::{parse, SyntaxTree};
use serde::Serialize;
use std::collections::BTreeSet;
use tree_sitter::Node;

/// Identifiers the model is allowed (and required) to rename
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateSet {
    method_name: Option<String>,
    names: BTreeSet<String>,
}

impl CandidateSet {
    /// Build a set from a method name and local names
    ///
    /// Constant-like names are filtered out.
    pub fn new<I, S>(method_name: Option<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|n| !is_constant_like(n))
            .collect();
        if let Some(method) = method_name.as_ref().filter(|m| !is_constant_like(m)) {
            names.insert(method.clone());
        }
        Self { method_name, names }
    }

    /// Declared name of the test method
    #[inline]
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// Whether `name` may be renamed
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Candidate names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there is nothing to rename
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Upper-case letters present and no lower-case letters
#[must_use]
pub fn is_constant_like(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

/// Compute the rename candidates of the test method inside `wrapped`
///
/// # Errors
/// - `CandidateError::Parse` if the text is not valid Java
/// - `CandidateError::Ambiguous` if the class holds several methods and
///   none of them is annotated as a test
pub fn extract_candidates(wrapped: &str) -> Result<CandidateSet, CandidateError> {
    let tree = parse(wrapped)?;
    let root = tree.root();

    let Some(class) = named_children(root).find(|n| n.kind() == "class_declaration") else {
        return Ok(CandidateSet::default());
    };
    let Some(body) = class.child_by_field_name("body") else {
        return Ok(CandidateSet::default());
    };

    let methods: Vec<Node<'_>> = named_children(body)
        .filter(|n| n.kind() == "method_declaration")
        .collect();

    let method = match methods.as_slice() {
        [] => return Ok(CandidateSet::default()),
        [only] => *only,
        many => *many
            .iter()
            .find(|m| has_test_annotation(&tree, **m))
            .ok_or(CandidateError::Ambiguous {
                methods: many.len(),
            })?,
    };

    let method_name = method
        .child_by_field_name("name")
        .map(|n| tree.text(n).to_string());
    Ok(CandidateSet::new(method_name, local_names(&tree, method)))
}

fn named_children(node: Node<'_>) -> impl Iterator<Item = Node<'_>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

fn has_test_annotation(tree: &SyntaxTree, method: Node<'_>) -> bool {
    named_children(method)
        .filter(|n| n.kind() == "modifiers")
        .flat_map(named_children)
        .filter(|n| matches!(n.kind(), "marker_annotation" | "annotation"))
        .filter_map(|n| n.child_by_field_name("name"))
        .map(|n| tree.text(n))
        .any(|name| name == "Test" || name.ends_with(".Test"))
}

fn local_names(tree: &SyntaxTree, method: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut push = |node: Option<Node<'_>>| {
        if let Some(n) = node.filter(|n| n.kind() == "identifier") {
            names.push(tree.text(n).to_string());
        }
    };

    for node in descendants(method) {
        match node.kind() {
            "formal_parameter"
            | "variable_declarator"
            | "enhanced_for_statement"
            | "catch_formal_parameter" => push(node.child_by_field_name("name")),
            "lambda_expression" => {
                if let Some(params) = node.child_by_field_name("parameters") {
                    match params.kind() {
                        "identifier" => push(Some(params)),
                        "inferred_parameters" => {
                            named_children(params).for_each(|p| push(Some(p)));
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    names
}

fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    loop {
        out.push(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.node() == node {
                return out;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return out;
            }
        }
    }
}
