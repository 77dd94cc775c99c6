//! Named readiness targets ("requires X before starting").
//!
//! A subsystem's `initialize` hook can block on targets contributed by other
//! subsystems; whoever completes the prerequisite calls `reach`.

mod gate;
mod registry;
mod sink;

pub use gate::TargetGate;
pub use registry::TargetRegistry;
pub use sink::{LogSink, TracingSink};
