//! Identifier mappings and decoding of generator responses

use renamer_java::CandidateSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Old identifier name to new identifier name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentifierMapping(BTreeMap<String, String>);

impl IdentifierMapping {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New name for `old`
    #[must_use]
    pub fn get(&self, old: &str) -> Option<&str> {
        self.0.get(old).map(String::as_str)
    }

    /// Whether `old` is mapped
    #[inline]
    #[must_use]
    pub fn contains_key(&self, old: &str) -> bool {
        self.0.contains_key(old)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keep only candidate keys; returns the kept mapping and the dropped keys
    #[must_use]
    pub fn restrict_to(self, candidates: &CandidateSet) -> (Self, Vec<String>) {
        let (kept, dropped): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .0
            .into_iter()
            .partition(|(k, _)| candidates.contains(k));
        (Self(kept), dropped.into_keys().collect())
    }

    /// Candidates that have no entry, in sorted order
    #[must_use]
    pub fn missing(&self, candidates: &CandidateSet) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| !self.contains_key(c))
            .map(str::to_string)
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for IdentifierMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Outcome of decoding raw generator text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedResponse {
    /// Text holds no parseable JSON
    ParseFailure(String),
    /// JSON that is not a flat object of strings
    ShapeFailure(String),
    /// Usable mapping
    Mapping(IdentifierMapping),
}

fn strip_markdown_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(without_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_header = without_open
        .find('\n')
        .map_or(without_open, |i| &without_open[i + 1..]);
    match after_header.rfind("```") {
        Some(end) => after_header[..end].trim(),
        None => after_header.trim(),
    }
}

/// Mapping embedded in surrounding chatter
///
/// Only a non-empty object of strings counts, so code braces such as the
/// body of an echoed method are not mistaken for a reply.
fn embedded_mapping(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]).ok()? {
        Value::Object(object) if !object.is_empty() && object.values().all(Value::is_string) => {
            Some(Value::Object(object))
        }
        _ => None,
    }
}

fn parse_json(text: &str) -> Result<Value, String> {
    serde_json::from_str::<Value>(text).or_else(|full_err| {
        embedded_mapping(text).ok_or_else(|| full_err.to_string())
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode the generator's reply into a mapping
///
/// Markdown fences are stripped. When the whole text is not JSON, the span
/// from the first `{` to the last `}` is tried.
#[must_use]
pub fn decode_response(raw: &str) -> DecodedResponse {
    let text = strip_markdown_fences(raw);
    let value = match parse_json(text) {
        Ok(value) => value,
        Err(reason) => return DecodedResponse::ParseFailure(reason),
    };

    let Value::Object(object) = value else {
        return DecodedResponse::ShapeFailure(format!(
            "expected a JSON object, got {}",
            kind_of(&value)
        ));
    };

    let mut mapping = BTreeMap::new();
    for (key, value) in object {
        match value {
            Value::String(new_name) => {
                mapping.insert(key, new_name);
            }
            other => {
                return DecodedResponse::ShapeFailure(format!(
                    "value for {key:?} is {}, expected a string",
                    kind_of(&other)
                ));
            }
        }
    }
    DecodedResponse::Mapping(IdentifierMapping(mapping))
}
