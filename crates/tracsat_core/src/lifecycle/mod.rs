//! tracsat_core::lifecycle
//!
//! Pure subsystem lifecycle semantics. This module contains **no** threading;
//! the subsystem workers consult these tables under their own locks.
//!
//! Key ideas:
//! - Stable states + intermediate states (a hook is running)
//! - Explicit transition pipeline: `begin()` -> hook -> `finish()`
//! - Only shutdown may interrupt a transition in flight
//! - Shutdown and Failed are terminal; restart is rejected

mod engine;
mod graph;
mod state;
mod transition;

pub use engine::{available_transitions, begin, finish, goal_state_for_transition, CallbackResult};
pub use graph::{transition_graph, TransitionEdge, TransitionGraph};
pub use state::{State, ALL_STATES};
pub use transition::Transition;
