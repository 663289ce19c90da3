//! Orchestrator scenarios against a scripted generator

use pretty_assertions::assert_eq;
use renamer_core::{reassemble, RenameOrchestrator, RenameSettings};
use renamer_java::extract_spans;
use renamer_llm::GeneratorError;
use renamer_test_utils::{
    ScriptedGenerator, CALCULATOR_TEST, CALCULATOR_TEST0_MAPPING, CALCULATOR_TEST1_MAPPING,
    FUNC_1_MAPPING, FUNC_1_METHOD, FUNC_1_RENAMED,
};
use std::path::Path;

fn settings() -> RenameSettings {
    RenameSettings::default()
        .with_max_attempts(3)
        .with_model("test-model")
}

#[tokio::test]
async fn accepts_valid_mapping_first_try() {
    let generator = ScriptedGenerator::with_replies([FUNC_1_MAPPING]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.code(), FUNC_1_RENAMED);
    assert_eq!(case.new_name(), Some("testAddsTwo"));
    assert_eq!(case.attempts(), 1);
    assert_eq!(case.original_code(), FUNC_1_METHOD);

    let prompt = generator.user_prompt(0).unwrap();
    assert!(prompt.contains("public class TestClassX {"));
    assert!(prompt.contains("- func_1\n- var_1"));
}

#[tokio::test]
async fn invariant_violation_exhausts_budget() {
    let bad = r#"{"func_1": "testAddsTwo", "var_1": "3"}"#;
    let generator = ScriptedGenerator::with_replies([bad, bad, bad]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(!case.is_clean());
    assert_eq!(case.code(), "");
    assert_eq!(case.attempts(), 3);
    assert_eq!(generator.calls(), 3);
    assert!(case.failure().unwrap().contains("more than identifier names"));

    let retry = generator.user_prompt(1).unwrap();
    assert!(retry.contains("rejected for this reason"));
    assert!(retry.contains(bad));
    assert!(retry.contains(FUNC_1_METHOD));
}

#[tokio::test]
async fn reserved_word_as_new_name_is_rejected() {
    let reply = r#"{"func_1": "testAddsTwo", "var_1": "class"}"#;
    let generator = ScriptedGenerator::with_replies([reply, FUNC_1_MAPPING]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.attempts(), 2);
    assert_eq!(case.code(), FUNC_1_RENAMED);
    assert!(generator
        .user_prompt(1)
        .unwrap()
        .contains("more than identifier names"));
}

#[tokio::test]
async fn missing_identifiers_are_retried() {
    let generator =
        ScriptedGenerator::with_replies([r#"{"func_1": "testAddsTwo"}"#, FUNC_1_MAPPING]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.attempts(), 2);
    let retry = generator.user_prompt(1).unwrap();
    assert!(retry.contains("mapping is missing identifiers: var_1"));
}

#[tokio::test]
async fn extra_keys_are_dropped_not_rejected() {
    let reply = r#"{"func_1": "testAddsTwo", "var_1": "result", "assertEquals": "check"}"#;
    let generator = ScriptedGenerator::with_replies([reply]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.code(), FUNC_1_RENAMED);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn malformed_then_fenced_reply() {
    let generator = ScriptedGenerator::with_replies([
        "I would rename func_1 to testAddsTwo.".to_string(),
        format!("```json\n{FUNC_1_MAPPING}\n```"),
    ]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.attempts(), 2);
    assert!(generator
        .user_prompt(1)
        .unwrap()
        .contains("response is not valid JSON"));
}

#[tokio::test]
async fn wrong_shape_is_retried() {
    let generator = ScriptedGenerator::with_replies([r#"["testAddsTwo", "result"]"#, FUNC_1_MAPPING]);
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert!(generator
        .user_prompt(1)
        .unwrap()
        .contains("not a flat name mapping"));
}

#[tokio::test]
async fn upstream_error_resends_same_prompt() {
    let generator = ScriptedGenerator::new();
    generator.push_error(GeneratorError::Upstream {
        status: 502,
        body: "Upstream LLM error".into(),
    });
    generator.push_reply(FUNC_1_MAPPING);

    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(case.is_clean());
    assert_eq!(case.attempts(), 2);
    let prompts = generator.prompts();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn repeated_upstream_failures_leave_method_unchanged() {
    let generator = ScriptedGenerator::new();
    for _ in 0..3 {
        generator.push_error(GeneratorError::Timeout { secs: 30 });
    }
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("func_1", FUNC_1_METHOD)
        .await;

    assert!(!case.is_clean());
    assert_eq!(generator.calls(), 3);
    assert!(case.failure().unwrap().contains("timed out"));
}

#[tokio::test]
async fn nothing_to_rename_skips_generator() {
    let generator = ScriptedGenerator::new();
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("TEST", "@Test public void TEST() { assertTrue(OK); }")
        .await;

    assert!(!case.is_clean());
    assert_eq!(case.attempts(), 0);
    assert_eq!(generator.calls(), 0);
    assert_eq!(case.failure(), Some("no rename candidates"));
}

#[tokio::test]
async fn unparseable_method_skips_generator() {
    let generator = ScriptedGenerator::new();
    let settings = settings();
    let case = RenameOrchestrator::new(&generator, &settings)
        .rename("broken", "@Test public void broken( { int x = ; }")
        .await;

    assert!(!case.is_clean());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn file_round_trip_through_spans_and_reassembly() {
    let generator =
        ScriptedGenerator::with_replies([CALCULATOR_TEST0_MAPPING, CALCULATOR_TEST1_MAPPING]);
    let settings = settings();
    let orchestrator = RenameOrchestrator::new(&generator, &settings);

    let spans = extract_spans(CALCULATOR_TEST, Path::new("Calculator_ESTest.java"));
    assert_eq!(spans.len(), 2);

    let mut cases = Vec::new();
    for span in &spans {
        cases.push(orchestrator.rename_span(span, CALCULATOR_TEST).await);
    }
    assert!(cases.iter().all(|c| c.is_clean()));

    let merged = reassemble(CALCULATOR_TEST, &cases).unwrap();
    assert!(merged.contains("public void testAddTwoAndThree() throws Throwable {"));
    assert!(merged.contains("int sum = calculator.add(2, 3);"));
    assert!(merged.contains("public void testAddZero() throws Throwable {"));
    assert!(merged.contains("for (int value : new int[] { 1, 2 }) {"));
    assert!(merged.contains("private Calculator helper() {"));
    assert!(!merged.contains("calculator0"));
}
