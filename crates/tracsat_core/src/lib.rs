//! tracsat_core: lifecycle core for independently running controller subsystems.
//!
//! Design goals:
//! - One dedicated worker thread per subsystem, explicit lifecycle states.
//! - Named readiness targets to order startup across subsystems.
//! - Misuse fails loudly with a typed error; nothing is silently ignored.

pub mod error;

/// Lifecycle state machine tables (no threading).
pub mod lifecycle;

/// Named one-shot readiness gates shared between subsystems.
pub mod target;

/// Continuous and one-shot subsystem drivers.
pub mod subsystem;

pub use error::{CoreError, Result};
pub use lifecycle::{State, Transition};
pub use subsystem::{ContinuousSubsystem, OneShotSubsystem, SubsystemHooks, TransitionEvent};
pub use target::{LogSink, TargetRegistry};
