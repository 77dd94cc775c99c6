use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::lifecycle::{CallbackResult, State, Transition};

use super::shared::{Control, Shared};
use super::{SubsystemHooks, TransitionEvent};

/// A subsystem whose `execute` hook runs in a loop on a dedicated thread,
/// suited to feedback and control loops.
///
/// Lifecycle: `start` -> (`halt` <-> `resume`)* -> `shutdown`. Every operation
/// is validated against the lifecycle tables; anything after shutdown fails.
///
/// The handle is cheap to clone; all clones drive the same worker. Dropping
/// every handle does not stop a running worker; call `shutdown` first.
pub struct ContinuousSubsystem<H: SubsystemHooks> {
    shared: Arc<Shared<H>>,
}

impl<H: SubsystemHooks> Clone for ContinuousSubsystem<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: SubsystemHooks> ContinuousSubsystem<H> {
    /// Create a subsystem in `Created`. The name should be unique; it also
    /// names the worker thread.
    pub fn new(name: impl Into<String>, hooks: H) -> Result<Self> {
        Ok(Self {
            shared: Shared::new(name, hooks)?,
        })
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn state(&self) -> State {
        self.shared.state()
    }

    pub fn hooks(&self) -> &H {
        &self.shared.hooks
    }

    pub fn is_halted(&self) -> bool {
        self.shared.is_halted()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// Terminal failure recorded by the worker, if any.
    pub fn last_error(&self) -> Option<CoreError> {
        self.shared.last_error()
    }

    /// Diagnostic label of the halt acknowledgement channel.
    pub fn halt_target_name(&self) -> String {
        format!("{}.halt", self.shared.name())
    }

    pub fn subscribe_transition_events(&self) -> broadcast::Receiver<TransitionEvent> {
        self.shared.subscribe()
    }

    /// Launch the worker. Fails on every call after the first.
    pub fn start(&self) -> Result<()> {
        self.shared.start(run_loop::<H>)
    }

    /// Pause execution; returns once the worker has stopped calling `execute`.
    ///
    /// `on_halt` runs first (an `execute` call may still be in flight), then
    /// `after_halt` once the worker has acknowledged.
    pub fn halt(&self) -> Result<()> {
        self.halt_with(None)
    }

    /// `halt` with a deadline. If the worker does not acknowledge in time the
    /// halt is withdrawn, the subsystem keeps running and `Timeout` is returned.
    pub fn halt_timeout(&self, timeout: Duration) -> Result<()> {
        self.halt_with(Some(timeout))
    }

    /// Continue after a halt. `on_resume` runs before execution restarts.
    pub fn resume(&self) -> Result<()> {
        let s: &Shared<H> = &self.shared;
        {
            let mut ctl = s.lock();
            s.begin_locked(&mut ctl, Transition::Resume)?;
        }

        s.run_hook("on_resume", H::on_resume, |ctl| {
            if ctl.state == State::Resuming {
                // Still halted; the worker stays parked.
                let _ = s.finish_locked(ctl, Transition::Resume, CallbackResult::Failure);
            }
        })?;

        let mut ctl = s.lock();
        if ctl.state != State::Resuming {
            return Err(s.invalid_state("shut down while resuming"));
        }
        ctl.halted = false;
        s.finish_locked(&mut ctl, Transition::Resume, CallbackResult::Success)?;
        s.changed.notify_all();
        Ok(())
    }

    /// Stop for good. `on_shutdown` runs here; the worker finishes its current
    /// iteration and runs `after_shutdown` last. Use `acquire_lock` to wait.
    pub fn shutdown(&self) -> Result<()> {
        self.shared.shutdown()
    }

    /// Block until the worker has terminated; returns its terminal result.
    pub fn acquire_lock(&self) -> Result<()> {
        self.shared.join(None)
    }

    pub fn acquire_lock_timeout(&self, timeout: Duration) -> Result<()> {
        self.shared.join(Some(timeout))
    }

    fn halt_with(&self, timeout: Option<Duration>) -> Result<()> {
        let s: &Shared<H> = &self.shared;
        let cycle = {
            let mut ctl = s.lock();
            s.begin_locked(&mut ctl, Transition::Halt)?;
            ctl.halted = true;
            ctl.halt_cycle += 1;
            ctl.halt_cycle
        };
        debug!(subsystem = %s.name(), cycle, channel = %self.halt_target_name(), "halt requested");

        s.run_hook("on_halt", H::on_halt, |ctl| withdraw_halt(s, ctl))?;

        let mut ctl = s.wait_for(s.lock(), timeout, |c| {
            c.acked_cycle < cycle && !c.loop_exited
        });

        if ctl.acked_cycle < cycle {
            if ctl.loop_exited || ctl.state != State::Halting {
                return Err(s.invalid_state("shut down while halt was pending"));
            }

            // Timed out: withdraw the halt so the worker keeps going.
            withdraw_halt(s, &mut ctl);
            s.changed.notify_all();

            let limit = timeout.unwrap_or_default();
            warn!(subsystem = %s.name(), cycle, "halt not acknowledged in {limit:?}");
            return Err(CoreError::timeout("halt", limit));
        }
        drop(ctl);

        s.run_hook("after_halt", H::after_halt, |ctl| withdraw_halt(s, ctl))?;

        let mut ctl = s.lock();
        if ctl.state == State::Halting {
            s.finish_locked(&mut ctl, Transition::Halt, CallbackResult::Success)?;
        }
        Ok(())
    }
}

/// Roll a pending halt back to `Running` and let the worker continue.
fn withdraw_halt<H>(s: &Shared<H>, ctl: &mut Control) {
    if ctl.state == State::Halting {
        ctl.halted = false;
        let _ = s.finish_locked(ctl, Transition::Halt, CallbackResult::Failure);
    }
}

/// Worker body: initialize, then execute until shutdown, parking while halted.
fn run_loop<H: SubsystemHooks>(s: &Shared<H>) -> Result<()> {
    s.initialize()?;

    loop {
        let mut ctl = s.lock();
        if ctl.shutdown {
            break;
        }

        if ctl.halted {
            if ctl.acked_cycle != ctl.halt_cycle {
                ctl.acked_cycle = ctl.halt_cycle;
                debug!(subsystem = %s.name(), cycle = ctl.halt_cycle, "halt acknowledged");
                s.changed.notify_all();
            }
            // Park only while the current cycle is acknowledged; a halt that
            // lands between a resume and this wake-up still gets its ack.
            drop(s.wait(ctl, |c| {
                c.halted && !c.shutdown && c.acked_cycle == c.halt_cycle
            }));
            continue;
        }

        drop(ctl);
        s.hooks.execute();
    }

    s.complete_shutdown()
}
