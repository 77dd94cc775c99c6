//! tracsat_core::subsystem
//!
//! Threaded lifecycle drivers built on the pure tables in `lifecycle`.
//!
//! Each subsystem owns exactly one worker thread, launched by `start` and
//! never reused. The caller and the worker communicate only through a
//! mutex-guarded control block and its condvar:
//! - halt is a handshake: the caller bumps a halt cycle and blocks until the
//!   worker acknowledges that cycle (once) from the top of its loop
//! - resume clears the halted flag after `on_resume` and wakes the worker
//! - shutdown is observed at the worker's loop boundary; the worker runs
//!   `after_shutdown` last and posts its terminal result for `acquire_lock`

mod continuous;
mod events;
mod hooks;
mod one_shot;
mod shared;

pub use continuous::ContinuousSubsystem;
pub use events::TransitionEvent;
pub use hooks::SubsystemHooks;
pub use one_shot::OneShotSubsystem;
