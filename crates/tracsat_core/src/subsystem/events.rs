//! Lifecycle event types.
//!
//! Every completed transition is published on a broadcast channel so that
//! supervisors and telemetry can follow subsystems without polling.

use crate::lifecycle::{State, Transition};

/// Emitted after a transition completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub subsystem: String,
    pub transition: Transition,
    pub start_state: State,
    pub goal_state: State,
}
