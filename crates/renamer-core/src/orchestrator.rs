//! Retry orchestrator
//!
//! Drives one method through `Building -> AwaitingResponse -> Validating`
//! and on to `Accepted`, `Retrying` or `Exhausted`. Each attempt works from
//! an immutable [`AttemptContext`]; the only thing carried between attempts
//! is the next prompt, which is rebuilt from scratch after every rejection.

use crate::apply::apply_mapping;
use crate::error::AttemptError;
use crate::invariant::{check_only_renames, unified_diff};
use crate::mapping::{decode_response, DecodedResponse, IdentifierMapping};
use crate::prompts::{initial_prompt, retry_prompt};
use crate::state::{validate_transition, Phase};
use crate::types::TestCase;
use renamer_java::{extract_candidates, wrap, CandidateError, CandidateSet, TestSpan};
use renamer_llm::{ChatMessage, TextGenerator};

/// Per-run knobs of the orchestrator
#[derive(Debug, Clone)]
pub struct RenameSettings {
    /// Generator calls allowed per method
    pub max_attempts: usize,
    /// Model passed to the generator
    pub model_id: String,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            model_id: "gpt-4o-mini".to_string(),
        }
    }
}

impl RenameSettings {
    /// Set attempt budget
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set model id
    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

/// Fixed inputs of every attempt on one method
#[derive(Debug, Clone)]
pub struct AttemptContext {
    code: String,
    wrapped: String,
    candidates: CandidateSet,
}

impl AttemptContext {
    /// Wrap `code` and compute its candidates
    ///
    /// # Errors
    /// - `CandidateError` if the wrapped method cannot be analysed
    pub fn new(code: &str) -> Result<Self, CandidateError> {
        let lines: Vec<&str> = code.lines().collect();
        let wrapped = wrap(&lines);
        let candidates = extract_candidates(&wrapped)?;
        Ok(Self {
            code: code.to_string(),
            wrapped,
            candidates,
        })
    }

    /// Original method text
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Method inside the synthetic class
    #[inline]
    #[must_use]
    pub fn wrapped(&self) -> &str {
        &self.wrapped
    }

    /// Names that must be renamed
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }
}

/// Rewrite that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRename {
    /// Rewritten method text
    pub code: String,
    /// New method name, if the method name was a candidate
    pub new_name: Option<String>,
    /// Mapping restricted to candidates
    pub mapping: IdentifierMapping,
}

/// Judge one generator reply
///
/// Checks run in order: JSON, shape, extra keys (dropped), missing keys,
/// application, then the only-renames invariant.
///
/// # Errors
/// - `AttemptError` naming the first failed check
pub fn validate_response(ctx: &AttemptContext, raw: &str) -> Result<AcceptedRename, AttemptError> {
    let mapping = match decode_response(raw) {
        DecodedResponse::ParseFailure(reason) => {
            return Err(AttemptError::MalformedResponse { reason })
        }
        DecodedResponse::ShapeFailure(reason) => return Err(AttemptError::WrongShape { reason }),
        DecodedResponse::Mapping(mapping) => mapping,
    };

    let (mapping, dropped) = mapping.restrict_to(&ctx.candidates);
    if !dropped.is_empty() {
        tracing::warn!(keys = ?dropped, "dropping keys that are not rename candidates");
    }

    let missing = mapping.missing(&ctx.candidates);
    if !missing.is_empty() {
        return Err(AttemptError::MissingIdentifiers { missing });
    }

    let renamed = apply_mapping(&ctx.code, &mapping).map_err(AttemptError::Unlexable)?;
    if let Err(divergence) = check_only_renames(&ctx.code, &renamed) {
        tracing::info!(
            "rewrite rejected ({})\n{}",
            divergence,
            unified_diff(&ctx.code, &renamed)
        );
        return Err(divergence.into());
    }

    let new_name = ctx
        .candidates
        .method_name()
        .and_then(|m| mapping.get(m))
        .map(str::to_string);
    Ok(AcceptedRename {
        code: renamed,
        new_name,
        mapping,
    })
}

/// Orchestrator state with the data each phase needs
#[derive(Debug)]
enum RenameState {
    Building,
    AwaitingResponse {
        attempt: usize,
        messages: Vec<ChatMessage>,
    },
    Validating {
        attempt: usize,
        response: String,
    },
    Retrying {
        attempt: usize,
        messages: Vec<ChatMessage>,
    },
    Accepted {
        attempt: usize,
        rename: AcceptedRename,
    },
    Exhausted {
        attempts: usize,
        reason: String,
    },
}

impl RenameState {
    fn phase(&self) -> Phase {
        match self {
            Self::Building => Phase::Building,
            Self::AwaitingResponse { .. } => Phase::AwaitingResponse,
            Self::Validating { .. } => Phase::Validating,
            Self::Retrying { .. } => Phase::Retrying,
            Self::Accepted { .. } => Phase::Accepted,
            Self::Exhausted { .. } => Phase::Exhausted,
        }
    }
}

/// Bounded request/validate/repair loop over a text generator
pub struct RenameOrchestrator<'a> {
    generator: &'a dyn TextGenerator,
    settings: &'a RenameSettings,
}

impl<'a> RenameOrchestrator<'a> {
    /// Create orchestrator over `generator`
    #[must_use]
    pub fn new(generator: &'a dyn TextGenerator, settings: &'a RenameSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Rename the method a span points at
    pub async fn rename_span(&self, span: &TestSpan, source: &str) -> TestCase {
        self.rename(&span.name, span.text(source)).await
    }

    /// Rename one method
    ///
    /// Never fails: anything that prevents an accepted rewrite yields an
    /// unclean [`TestCase`] that keeps the original.
    pub async fn rename(&self, name: &str, original_code: &str) -> TestCase {
        let mut ctx: Option<AttemptContext> = None;
        let mut state = RenameState::Building;

        loop {
            let from = state.phase();
            let next = match state {
                RenameState::Building => match AttemptContext::new(original_code) {
                    Ok(built) if built.candidates.is_empty() => RenameState::Exhausted {
                        attempts: 0,
                        reason: "no rename candidates".to_string(),
                    },
                    Ok(built) => {
                        let messages = initial_prompt(&built.wrapped, &built.candidates);
                        ctx = Some(built);
                        RenameState::AwaitingResponse {
                            attempt: 1,
                            messages,
                        }
                    }
                    Err(e) => RenameState::Exhausted {
                        attempts: 0,
                        reason: e.to_string(),
                    },
                },

                RenameState::AwaitingResponse { attempt, messages } => {
                    tracing::debug!(method = name, attempt, "requesting rename");
                    match self
                        .generator
                        .chat(&self.settings.model_id, &messages)
                        .await
                    {
                        Ok(response) => {
                            tracing::debug!(method = name, attempt, response = %response, "generator replied");
                            RenameState::Validating { attempt, response }
                        }
                        Err(e) => self.retry_or_exhaust(name, attempt, messages, e.into()),
                    }
                }

                RenameState::Validating { attempt, response } => {
                    let Some(built) = ctx.as_ref() else {
                        tracing::error!(method = name, "validating without a context");
                        break TestCase::unchanged(name, original_code, attempt, "internal state error");
                    };
                    match validate_response(built, &response) {
                        Ok(rename) => RenameState::Accepted { attempt, rename },
                        Err(e) if !e.consumes_attempt() => RenameState::Exhausted {
                            attempts: attempt,
                            reason: e.to_string(),
                        },
                        Err(e) => {
                            let messages =
                                retry_prompt(&built.code, &built.candidates, &e.to_string(), &response);
                            self.retry_or_exhaust(name, attempt, messages, e)
                        }
                    }
                }

                RenameState::Retrying { attempt, messages } => RenameState::AwaitingResponse {
                    attempt: attempt + 1,
                    messages,
                },

                RenameState::Accepted { attempt, rename } => {
                    tracing::info!(
                        method = name,
                        new_name = rename.new_name.as_deref().unwrap_or(name),
                        attempts = attempt,
                        "rename accepted"
                    );
                    break TestCase::accepted(
                        name,
                        original_code,
                        rename.code,
                        rename.new_name,
                        attempt,
                    );
                }

                RenameState::Exhausted { attempts, reason } => {
                    tracing::info!(method = name, attempts, reason = %reason, "method left unchanged");
                    break TestCase::unchanged(name, original_code, attempts, reason);
                }
            };

            if let Err(e) = validate_transition(from, next.phase()) {
                tracing::error!(method = name, error = %e, "orchestrator state error");
                break TestCase::unchanged(name, original_code, 0, e.to_string());
            }
            state = next;
        }
    }

    fn retry_or_exhaust(
        &self,
        name: &str,
        attempt: usize,
        messages: Vec<ChatMessage>,
        error: AttemptError,
    ) -> RenameState {
        if attempt >= self.settings.max_attempts {
            RenameState::Exhausted {
                attempts: attempt,
                reason: error.to_string(),
            }
        } else {
            tracing::warn!(method = name, attempt, error = %error, "attempt rejected, retrying");
            RenameState::Retrying { attempt, messages }
        }
    }
}
