//! Testing utilities for the renamer workspace
//!
//! Shared test doubles and Java fixtures.

#![allow(missing_docs)]

use parking_lot::Mutex;
use renamer_llm::{
    ChatMessage, GeneratorError, ReadabilityScore, ReadabilityScorer, ScorerError, TextGenerator,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Single-line test method used throughout the docs
pub const FUNC_1_METHOD: &str =
    "@Test public void func_1(){ int var_1 = 2; assertEquals(2, var_1); }";

/// `FUNC_1_METHOD` after the canonical rename
pub const FUNC_1_RENAMED: &str =
    "@Test public void testAddsTwo(){ int result = 2; assertEquals(2, result); }";

/// Mapping that turns `FUNC_1_METHOD` into `FUNC_1_RENAMED`
pub const FUNC_1_MAPPING: &str = r#"{"func_1": "testAddsTwo", "var_1": "result"}"#;

/// Generated test file with two tests and a helper
pub const CALCULATOR_TEST: &str = r#"package org.example;

import static org.junit.Assert.assertEquals;

import org.junit.Test;

public class Calculator_ESTest {

    @Test(timeout = 4000)
    public void test0() throws Throwable {
        Calculator calculator0 = new Calculator();
        int int0 = calculator0.add(2, 3);
        assertEquals(5, int0);
    }

    private Calculator helper() {
        return new Calculator();
    }

    @Test(timeout = 4000)
    public void test1() throws Throwable {
        Calculator calculator0 = helper();
        for (int int0 : new int[] { 1, 2 }) {
            assertEquals(int0, calculator0.add(int0, 0));
        }
    }
}
"#;

/// Reply renaming `test0` of `CALCULATOR_TEST`
pub const CALCULATOR_TEST0_MAPPING: &str =
    r#"{"test0": "testAddTwoAndThree", "calculator0": "calculator", "int0": "sum"}"#;

/// Reply renaming `test1` of `CALCULATOR_TEST`
pub const CALCULATOR_TEST1_MAPPING: &str =
    r#"{"test1": "testAddZero", "calculator0": "calculator", "int0": "value"}"#;

/// Text generator that replays canned replies and records what it was sent
///
/// Clones share the same script and call log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String, GeneratorError>>>>,
    prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator that answers with each reply in turn
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for reply in replies {
            generator.push_reply(reply);
        }
        generator
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: GeneratorError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Conversations received so far
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// User message of the n-th call
    pub fn user_prompt(&self, call: usize) -> Option<String> {
        self.prompts
            .lock()
            .get(call)
            .and_then(|m| m.last())
            .map(|m| m.content.clone())
    }
}

#[async_trait::async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn chat(
        &self,
        _model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GeneratorError> {
        self.prompts.lock().push(messages.to_vec());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(GeneratorError::Transport("script exhausted".to_string())))
    }
}

/// Generator that answers by looking at the prompt
///
/// The first route whose needle occurs in the last message wins. Safe to
/// share across concurrent workers since replies do not depend on order.
#[derive(Debug, Clone, Default)]
pub struct RoutedGenerator {
    routes: Vec<(String, String)>,
    calls: Arc<Mutex<usize>>,
}

impl RoutedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `reply` whenever the prompt contains `needle`
    #[must_use]
    pub fn route(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.routes.push((needle.into(), reply.into()));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait::async_trait]
impl TextGenerator for RoutedGenerator {
    async fn chat(
        &self,
        _model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GeneratorError> {
        *self.calls.lock() += 1;
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        self.routes
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| GeneratorError::Upstream {
                status: 404,
                body: "no route for prompt".to_string(),
            })
    }
}

/// Scorer that always returns the same result
#[derive(Debug, Clone)]
pub struct FixedScorer(pub Result<ReadabilityScore, ScorerError>);

impl FixedScorer {
    pub fn ok(average: f64, weighted_average: f64) -> Self {
        Self(Ok(ReadabilityScore {
            average,
            weighted_average,
        }))
    }

    pub fn failing() -> Self {
        Self(Err(ScorerError::Transport("connection refused".to_string())))
    }
}

#[async_trait::async_trait]
impl ReadabilityScorer for FixedScorer {
    async fn score(&self, _code: &str) -> Result<ReadabilityScore, ScorerError> {
        self.0.clone()
    }
}

/// Write a fixture file under `dir` and return its path
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// One line of an oracle `.jsonl` file
pub fn oracle_line(prompt: &str, response: &str) -> String {
    serde_json::json!({ "prompt": prompt, "response": response }).to_string()
}
