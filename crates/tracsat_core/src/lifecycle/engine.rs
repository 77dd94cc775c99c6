use crate::error::{CoreError, Result};

use super::{State, Transition};

/// Outcome of the hook that runs while a transition is in flight.
///
/// - Success: proceed to the expected next state
/// - Failure: fall back (Start fails terminally, Halt/Resume roll back)
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CallbackResult {
    Success,
    Failure,
}

impl From<bool> for CallbackResult {
    fn from(ok: bool) -> Self {
        if ok {
            CallbackResult::Success
        } else {
            CallbackResult::Failure
        }
    }
}

/// Begin a lifecycle transition by moving from a **stable** state into the
/// matching **intermediate** state.
///
/// This enforces:
/// - which requests are allowed from which states
/// - that nothing but shutdown may interrupt a transition already in flight
/// - that terminal states accept nothing (no restart after shutdown)
pub fn begin(current: State, via: Transition) -> Result<State> {
    use State::*;

    let next = match (current, via) {
        (Created, Transition::Start) => Initializing,
        (Running, Transition::Halt) => Halting,
        (Halted, Transition::Resume) => Resuming,

        // Shutdown may start from anything that is not already on its way out
        (s, Transition::Shutdown) if !s.is_terminal() && s != ShuttingDown => ShuttingDown,

        _ => {
            return Err(CoreError::invalid_transition_lifecycle(
                current.id(),
                via.id(),
            ));
        }
    };

    Ok(next)
}

/// Finish a lifecycle transition by leaving an **intermediate** state for a
/// **stable** one, based on the hook outcome.
pub fn finish(intermediate: State, via: Transition, result: CallbackResult) -> Result<State> {
    use CallbackResult::*;
    use State::*;

    let next = match (intermediate, via, result) {
        // Start: Created -> Initializing -> (Running | Failed)
        (Initializing, Transition::Start, Success) => Running,
        (Initializing, Transition::Start, Failure) => Failed,

        // Halt: Running -> Halting -> (Halted | Running)
        (Halting, Transition::Halt, Success) => Halted,
        (Halting, Transition::Halt, Failure) => Running,

        // Resume: Halted -> Resuming -> (Running | Halted)
        (Resuming, Transition::Resume, Success) => Running,
        (Resuming, Transition::Resume, Failure) => Halted,

        // Shutdown is terminal regardless of outcome
        (ShuttingDown, Transition::Shutdown, _) => Shutdown,

        _ => {
            return Err(CoreError::invalid_transition_lifecycle(
                intermediate.id(),
                via.id(),
            ));
        }
    };

    Ok(next)
}

/// Expected goal state when a transition succeeds.
pub fn goal_state_for_transition(start: State, transition: Transition) -> Result<State> {
    let intermediate = begin(start, transition)?;
    finish(intermediate, transition, CallbackResult::Success)
}

/// Requests accepted in a given state.
///
/// Intermediate states only accept shutdown; `ShuttingDown` and the terminal
/// states accept nothing.
pub fn available_transitions(state: State) -> &'static [Transition] {
    use Transition::*;

    match state {
        State::Created => &[Start, Shutdown],
        State::Running => &[Halt, Shutdown],
        State::Halted => &[Resume, Shutdown],
        State::Initializing | State::Halting | State::Resuming => &[Shutdown],
        State::ShuttingDown | State::Shutdown | State::Failed => &[],
    }
}

/// Unit tests for lifecycle state machine primitives.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Domain, ErrorKind, Payload};

    #[test]
    fn invalid_transition_has_payload() {
        let e = begin(State::Running, Transition::Resume).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidTransition);
        assert_eq!(e.domain, Domain::Lifecycle);

        match e.payload {
            Payload::LifecycleTransition {
                from_state,
                via_transition,
            } => {
                assert_eq!(from_state, State::Running.id());
                assert_eq!(via_transition, Transition::Resume.id());
            }
            _ => panic!("expected LifecycleTransition payload"),
        }
    }

    #[test]
    fn start_path_uses_intermediate_state() {
        let mid = begin(State::Created, Transition::Start).unwrap();
        assert_eq!(mid, State::Initializing);

        let end = finish(mid, Transition::Start, CallbackResult::Success).unwrap();
        assert_eq!(end, State::Running);

        let failed = finish(mid, Transition::Start, CallbackResult::Failure).unwrap();
        assert_eq!(failed, State::Failed);
    }

    #[test]
    fn start_is_accepted_only_once() {
        for state in [
            State::Initializing,
            State::Running,
            State::Halted,
            State::ShuttingDown,
            State::Shutdown,
            State::Failed,
        ] {
            assert!(begin(state, Transition::Start).is_err(), "{state}");
        }
    }

    #[test]
    fn nothing_is_accepted_after_shutdown() {
        for via in [
            Transition::Start,
            Transition::Halt,
            Transition::Resume,
            Transition::Shutdown,
        ] {
            assert!(begin(State::Shutdown, via).is_err());
            assert!(begin(State::ShuttingDown, via).is_err());
            assert!(available_transitions(State::Shutdown).is_empty());
        }
    }

    #[test]
    fn available_transitions_test() {
        let transitions = available_transitions(State::Running);

        assert_eq!(transitions.len(), 2);
        assert!(transitions.contains(&Transition::Halt));
        assert!(!transitions.contains(&Transition::Resume));
    }

    #[test]
    fn failure_paths_roll_back() {
        let cases = [
            (State::Running, Transition::Halt, State::Running),
            (State::Halted, Transition::Resume, State::Halted),
            (State::Running, Transition::Shutdown, State::Shutdown),
        ];

        for (start, transition, expected) in cases {
            let mid = begin(start, transition).unwrap();
            let end = finish(mid, transition, CallbackResult::Failure).unwrap();
            assert_eq!(end, expected);
        }
    }

    #[test]
    fn finish_rejects_mismatched_pairs() {
        let err = finish(State::Halting, Transition::Resume, CallbackResult::Success).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
        assert!(finish(State::Running, Transition::Halt, CallbackResult::Success).is_err());
    }
}
