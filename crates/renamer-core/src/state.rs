//! Phases of a single method's rename and their legal transitions

use crate::error::TransitionError;
use serde::Serialize;

/// Where a rename currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Computing candidates and the first prompt
    Building,
    /// Waiting on the generator
    AwaitingResponse,
    /// Checking the generator's reply
    Validating,
    /// Preparing the next attempt
    Retrying,
    /// Rewrite passed every check
    Accepted,
    /// Gave up; original is kept
    Exhausted,
}

impl Phase {
    /// Whether the rename is finished
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted)
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Phase) -> &'static [Phase] {
    use Phase::*;
    match from {
        Building => &[AwaitingResponse, Exhausted],
        AwaitingResponse => &[Validating, Retrying, Exhausted],
        Validating => &[Accepted, Retrying, Exhausted],
        Retrying => &[AwaitingResponse],
        Accepted | Exhausted => &[],
    }
}

/// Check a single step
///
/// # Errors
/// - `TransitionError` if `to` is not reachable from `from`
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        let path = [
            Phase::Building,
            Phase::AwaitingResponse,
            Phase::Validating,
            Phase::Retrying,
            Phase::AwaitingResponse,
            Phase::Validating,
            Phase::Accepted,
        ];
        for pair in path.windows(2) {
            assert!(validate_transition(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn terminal_phases_have_no_exits() {
        assert!(allowed_transitions(Phase::Accepted).is_empty());
        assert!(allowed_transitions(Phase::Exhausted).is_empty());
        assert!(Phase::Exhausted.is_terminal());
        assert!(!Phase::Retrying.is_terminal());
    }

    #[test]
    fn cannot_accept_without_validating() {
        assert_eq!(
            validate_transition(Phase::AwaitingResponse, Phase::Accepted),
            Err(TransitionError {
                from: Phase::AwaitingResponse,
                to: Phase::Accepted
            })
        );
    }
}
