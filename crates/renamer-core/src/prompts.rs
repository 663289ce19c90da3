//! Prompt construction for the rename conversation

use renamer_java::CandidateSet;
use renamer_llm::ChatMessage;

/// Standing instruction sent with every request
pub const SYSTEM_INSTRUCTION: &str = "You are a code refactoring assistant for Java unit tests.\n\
You will be given:\n\
- A Java test method (wrapped in a dummy class), and\n\
- A list of identifier names (method + local variables + parameters).\n\n\
Your job is to propose more meaningful names for these identifiers.\n\
You MUST ONLY respond with a JSON object mapping originalName -> newName.\n\
You MUST NOT output code or comments or markdown.\n";

fn identifier_list(candidates: &CandidateSet) -> String {
    candidates
        .iter()
        .map(|name| format!("- {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First request for a method
#[must_use]
pub fn initial_prompt(wrapped: &str, candidates: &CandidateSet) -> Vec<ChatMessage> {
    let user = format!(
        "Here is the obfuscated Java test method wrapped in a dummy class:\n\n\
         ```java\n{wrapped}\n```\n\n\
         Here are the identifiers that may be renamed:\n{identifiers}\n\n\
         Propose more meaningful names for each of THESE identifiers only.\n\
         Return a single JSON object mapping originalName -> newName.\n\
         Example:\n\
         {{ \"func_1\": \"testYearEnd\", \"var_1\": \"yearEndDate\", \"var_2\": \"calendar\" }}\n\n\
         Important:\n\
         - Use ALL of the listed identifiers as keys, and ONLY those.\n\
         - Do NOT introduce new identifiers.\n\
         - Do NOT output anything except the JSON object (no backticks, no text).\n",
        identifiers = identifier_list(candidates),
    );
    vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(user)]
}

/// Self-contained follow-up after a rejected attempt
///
/// Carries the original code, the identifiers, why the last reply was
/// rejected and the reply itself, so no earlier turn is needed.
#[must_use]
pub fn retry_prompt(
    code: &str,
    candidates: &CandidateSet,
    reason: &str,
    previous_response: &str,
) -> Vec<ChatMessage> {
    let user = format!(
        "Here is the original obfuscated Java test method:\n\n\
         ```java\n{code}\n```\n\n\
         Here are the identifiers that may be renamed:\n{identifiers}\n\n\
         Your previous response was rejected for this reason:\n{reason}\n\n\
         Your previous response was:\n{previous_response}\n\n\
         Please try again.\n\
         Return a single JSON object mapping originalName -> newName.\n\
         Use ALL of the listed identifiers as keys, and ONLY those.\n\
         Do NOT introduce new identifiers or keys.\n\
         Do NOT output anything except the JSON object (no backticks, no text).\n",
        identifiers = identifier_list(candidates),
    );
    vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use renamer_llm::Role;

    fn candidates() -> CandidateSet {
        CandidateSet::new(Some("func_1".into()), ["var_1"])
    }

    #[test]
    fn initial_prompt_lists_identifiers() {
        let messages = initial_prompt("public class TestClassX {\n}", &candidates());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[1].content.contains("- func_1\n- var_1"));
        assert!(messages[1].content.contains("public class TestClassX"));
    }

    #[test]
    fn retry_prompt_is_self_contained() {
        let messages = retry_prompt(
            "void func_1() {}",
            &candidates(),
            "mapping is missing identifiers: var_1",
            "{\"func_1\": \"testIt\"}",
        );
        let user = &messages[1].content;
        assert!(user.contains("void func_1() {}"));
        assert!(user.contains("missing identifiers: var_1"));
        assert!(user.contains("{\"func_1\": \"testIt\"}"));
        assert!(user.contains("- var_1"));
    }
}
