//! Exchange phase state machine.
//!
//! Each mode slot carries its own phase:
//! - Idle -> AwaitingUserInput (input typed)
//! - AwaitingUserInput -> Idle (input cleared)
//! - Idle | AwaitingUserInput -> RequestInFlight (submit)
//! - RequestInFlight -> RequestInFlight (a newer submit supersedes)
//! - RequestInFlight -> Idle (response finished)
//! - RequestInFlight -> Error -> Idle (request failed)

use std::fmt;

use crate::error::ChatError;

/// Request lifecycle phase of one mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExchangePhase {
    /// Nothing typed, nothing in flight.
    #[default]
    Idle,
    /// The input buffer holds text that has not been submitted.
    AwaitingUserInput,
    /// A request was issued and its response has not finished.
    RequestInFlight,
    /// The last request failed; left immediately for `Idle`.
    Error,
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangePhase::Idle => write!(f, "Idle"),
            ExchangePhase::AwaitingUserInput => write!(f, "AwaitingUserInput"),
            ExchangePhase::RequestInFlight => write!(f, "RequestInFlight"),
            ExchangePhase::Error => write!(f, "Error"),
        }
    }
}

impl ExchangePhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ExchangePhase) -> bool {
        matches!(
            (self, target),
            (ExchangePhase::Idle, ExchangePhase::AwaitingUserInput)
                | (ExchangePhase::AwaitingUserInput, ExchangePhase::Idle)
                | (ExchangePhase::Idle, ExchangePhase::RequestInFlight)
                | (ExchangePhase::AwaitingUserInput, ExchangePhase::RequestInFlight)
                | (ExchangePhase::RequestInFlight, ExchangePhase::RequestInFlight)
                | (ExchangePhase::RequestInFlight, ExchangePhase::Idle)
                | (ExchangePhase::RequestInFlight, ExchangePhase::Error)
                | (ExchangePhase::Error, ExchangePhase::Idle)
        )
    }

    /// Validate and apply a transition in place.
    pub fn transition(&mut self, target: ExchangePhase) -> Result<(), ChatError> {
        if self.can_transition_to(&target) {
            tracing::debug!("Exchange phase: {} -> {}", self, target);
            *self = target;
            Ok(())
        } else {
            Err(ChatError::InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// A request is outstanding.
    pub fn is_loading(&self) -> bool {
        *self == ExchangePhase::RequestInFlight
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ExchangePhase; 4] = [
        ExchangePhase::Idle,
        ExchangePhase::AwaitingUserInput,
        ExchangePhase::RequestInFlight,
        ExchangePhase::Error,
    ];

    #[test]
    fn test_phase_display() {
        assert_eq!(ExchangePhase::Idle.to_string(), "Idle");
        assert_eq!(
            ExchangePhase::AwaitingUserInput.to_string(),
            "AwaitingUserInput"
        );
        assert_eq!(ExchangePhase::RequestInFlight.to_string(), "RequestInFlight");
        assert_eq!(ExchangePhase::Error.to_string(), "Error");
    }

    #[test]
    fn test_valid_transitions() {
        use ExchangePhase::*;
        assert!(Idle.can_transition_to(&AwaitingUserInput));
        assert!(AwaitingUserInput.can_transition_to(&Idle));
        assert!(Idle.can_transition_to(&RequestInFlight));
        assert!(AwaitingUserInput.can_transition_to(&RequestInFlight));
        assert!(RequestInFlight.can_transition_to(&RequestInFlight));
        assert!(RequestInFlight.can_transition_to(&Idle));
        assert!(RequestInFlight.can_transition_to(&Error));
        assert!(Error.can_transition_to(&Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        use ExchangePhase::*;
        assert!(!Idle.can_transition_to(&Error));
        assert!(!Idle.can_transition_to(&Idle));
        assert!(!AwaitingUserInput.can_transition_to(&Error));
        assert!(!Error.can_transition_to(&RequestInFlight));
        assert!(!Error.can_transition_to(&AwaitingUserInput));
        assert!(!RequestInFlight.can_transition_to(&AwaitingUserInput));
    }

    #[test]
    fn test_exactly_eight_valid_transitions() {
        let count = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(to))
            .count();
        assert_eq!(count, 8);
    }

    #[test]
    fn test_failure_path() {
        let mut phase = ExchangePhase::Idle;
        phase.transition(ExchangePhase::RequestInFlight).unwrap();
        assert!(phase.is_loading());
        phase.transition(ExchangePhase::Error).unwrap();
        assert!(!phase.is_loading());
        phase.transition(ExchangePhase::Idle).unwrap();
        assert_eq!(phase, ExchangePhase::Idle);
    }

    #[test]
    fn test_invalid_transition_leaves_phase_unchanged() {
        let mut phase = ExchangePhase::Error;
        let err = phase.transition(ExchangePhase::RequestInFlight).unwrap_err();
        assert!(matches!(err, ChatError::InvalidTransition { .. }));
        assert_eq!(phase, ExchangePhase::Error);
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ExchangePhase::default(), ExchangePhase::Idle);
    }
}
