use crate::error::Result;

use super::{available_transitions, goal_state_for_transition, State, Transition, ALL_STATES};

/// Lifecycle transition graph derived from the state/transition tables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransitionGraph {
    pub states: Vec<State>,
    pub transitions: Vec<TransitionEdge>,
}

/// Directed lifecycle transition edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionEdge {
    pub start: State,
    pub transition: Transition,
    pub goal: State,
}

impl TransitionGraph {
    /// Goal reached from `start` via `transition`, if that edge exists.
    pub fn goal(&self, start: State, transition: Transition) -> Option<State> {
        self.transitions
            .iter()
            .find(|edge| edge.start == start && edge.transition == transition)
            .map(|edge| edge.goal)
    }
}

/// Build the canonical subsystem lifecycle graph.
pub fn transition_graph() -> Result<TransitionGraph> {
    let mut transitions = Vec::new();

    for state in ALL_STATES {
        for transition in available_transitions(state) {
            let goal = goal_state_for_transition(state, *transition)?;
            transitions.push(TransitionEdge {
                start: state,
                transition: *transition,
                goal,
            });
        }
    }

    Ok(TransitionGraph {
        states: ALL_STATES.to_vec(),
        transitions,
    })
}
