use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::error::{CoreError, Domain, ErrorKind, Payload, Result};
use crate::lifecycle::{begin, finish, CallbackResult, State, Transition};

use super::{SubsystemHooks, TransitionEvent};

const EVENT_CAPACITY: usize = 32;

/// Worker body run on the dedicated thread (continuous loop or one-shot).
pub(crate) type WorkerBody<H> = fn(&Shared<H>) -> Result<()>;

/// Cross-thread subsystem state. Only ever touched under `Shared::control`.
#[derive(Debug)]
pub(crate) struct Control {
    pub(crate) state: State,
    /// Stable state the in-flight transition started from.
    origin: State,
    pub(crate) halted: bool,
    pub(crate) shutdown: bool,
    /// Bumped by every halt request.
    pub(crate) halt_cycle: u64,
    /// Last halt cycle the worker acknowledged.
    pub(crate) acked_cycle: u64,
    /// The worker left its execution loop; `execute` will not run again.
    pub(crate) loop_exited: bool,
    /// `on_shutdown` has returned.
    shutdown_notified: bool,
    /// The worker thread is done, normally or by panic.
    finished: bool,
    failure: Option<CoreError>,
}

impl Control {
    fn new() -> Self {
        Self {
            state: State::Created,
            origin: State::Created,
            halted: false,
            shutdown: false,
            halt_cycle: 0,
            acked_cycle: 0,
            loop_exited: false,
            shutdown_notified: false,
            finished: false,
            failure: None,
        }
    }
}

/// State shared between a subsystem handle and its worker thread.
///
/// One mutex guards `Control`; one condvar carries every wake-up (halt
/// acknowledgement, resume, shutdown, termination). Hooks always run with the
/// mutex released.
pub(crate) struct Shared<H> {
    name: String,
    pub(crate) hooks: H,
    control: Mutex<Control>,
    pub(crate) changed: Condvar,
    events: broadcast::Sender<TransitionEvent>,
    worker: Mutex<Option<JoinHandle<Result<()>>>>,
    exit: Mutex<Option<Result<()>>>,
}

impl<H> Shared<H> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Control> {
        // Hooks never run under this lock, so a poisoned guard still holds a
        // consistent control block.
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait<'a, F>(
        &self,
        guard: MutexGuard<'a, Control>,
        pending: F,
    ) -> MutexGuard<'a, Control>
    where
        F: FnMut(&mut Control) -> bool,
    {
        self.changed
            .wait_while(guard, pending)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Like `wait`, but gives up after `timeout`. The caller re-checks the
    /// condition on the returned guard.
    pub(crate) fn wait_for<'a, F>(
        &self,
        guard: MutexGuard<'a, Control>,
        timeout: Option<Duration>,
        pending: F,
    ) -> MutexGuard<'a, Control>
    where
        F: FnMut(&mut Control) -> bool,
    {
        match timeout {
            None => self.wait(guard, pending),
            Some(limit) => {
                let (guard, _) = self
                    .changed
                    .wait_timeout_while(guard, limit, pending)
                    .unwrap_or_else(PoisonError::into_inner);
                guard
            }
        }
    }

    pub(crate) fn invalid_state(&self, what: &str) -> CoreError {
        CoreError::warn()
            .domain(Domain::Subsystem)
            .kind(ErrorKind::InvalidState)
            .msgf(format_args!("{}: {what}", self.name))
            .payload(Payload::Subsystem(self.name.clone()))
            .build()
    }

    /// Move into the intermediate state for `via`, remembering where we came from.
    pub(crate) fn begin_locked(&self, ctl: &mut Control, via: Transition) -> Result<()> {
        match begin(ctl.state, via) {
            Ok(next) => {
                ctl.origin = ctl.state;
                ctl.state = next;
                Ok(())
            }
            Err(err) => {
                warn!(
                    subsystem = %self.name,
                    state = %ctl.state,
                    transition = %via,
                    "rejected lifecycle request"
                );
                Err(err)
            }
        }
    }

    /// Leave the intermediate state and publish the completed transition.
    pub(crate) fn finish_locked(
        &self,
        ctl: &mut Control,
        via: Transition,
        result: CallbackResult,
    ) -> Result<State> {
        let goal = finish(ctl.state, via, result)?;
        let event = TransitionEvent {
            subsystem: self.name.clone(),
            transition: via,
            start_state: ctl.origin,
            goal_state: goal,
        };
        ctl.state = goal;

        info!(
            subsystem = %self.name,
            transition = %via,
            from = %event.start_state,
            to = %goal,
            "lifecycle transition"
        );

        // Missing or lagging receivers never stall the lifecycle.
        let _ = self.events.send(event);
        Ok(goal)
    }
}

impl<H: SubsystemHooks> Shared<H> {
    pub(crate) fn new(name: impl Into<String>, hooks: H) -> Result<Arc<Self>> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::error()
                .domain(Domain::Subsystem)
                .kind(ErrorKind::InvalidArgument)
                .msg("subsystem name must not be empty")
                .build());
        }

        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);

        Ok(Arc::new(Self {
            name,
            hooks,
            control: Mutex::new(Control::new()),
            changed: Condvar::new(),
            events,
            worker: Mutex::new(None),
            exit: Mutex::new(None),
        }))
    }

    pub(crate) fn state(&self) -> State {
        self.lock().state
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.lock().halted
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    pub(crate) fn last_error(&self) -> Option<CoreError> {
        self.lock().failure.clone()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    /// Spawn the dedicated worker thread. Only the first call can succeed.
    pub(crate) fn start(self: &Arc<Self>, body: WorkerBody<H>) -> Result<()> {
        // Held across the spawn so `join` never sees a started worker without
        // its handle.
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut ctl = self.lock();
            self.begin_locked(&mut ctl, Transition::Start)?;
        }

        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run_worker(&shared, body));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(io) => {
                let err = CoreError::from(io);
                error!(subsystem = %self.name, "failed to spawn worker: {err}");

                let mut ctl = self.lock();
                let _ = self.finish_locked(&mut ctl, Transition::Start, CallbackResult::Failure);
                ctl.loop_exited = true;
                ctl.finished = true;
                ctl.failure = Some(err.clone());
                self.changed.notify_all();
                Err(err)
            }
        }
    }

    /// Worker side: run `initialize` and settle the start transition.
    pub(crate) fn initialize(&self) -> Result<()> {
        let ok = self.hooks.initialize();

        let mut ctl = self.lock();
        if ctl.state == State::Initializing {
            self.finish_locked(&mut ctl, Transition::Start, CallbackResult::from(ok))?;
        } else if !ok {
            // Shutdown arrived while initializing; the failure still wins.
            ctl.state = State::Failed;
        }

        if ok {
            Ok(())
        } else {
            Err(CoreError::initialization_failed(&self.name))
        }
    }

    /// Run a hook on the calling thread.
    ///
    /// A panicking hook is reported as `HookPanicked`; `recover` first puts
    /// the control block back into a state the worker can make progress from.
    pub(crate) fn run_hook<F, R>(&self, hook: &'static str, call: F, recover: R) -> Result<()>
    where
        F: FnOnce(&H),
        R: FnOnce(&mut Control),
    {
        if panic::catch_unwind(AssertUnwindSafe(|| call(&self.hooks))).is_ok() {
            return Ok(());
        }

        error!(subsystem = %self.name, hook, "hook panicked");
        let mut ctl = self.lock();
        recover(&mut ctl);
        self.changed.notify_all();
        Err(CoreError::hook_panicked(&self.name, hook))
    }

    /// Caller side of shutdown.
    pub(crate) fn shutdown(&self) -> Result<()> {
        let origin = {
            let mut ctl = self.lock();
            self.begin_locked(&mut ctl, Transition::Shutdown)?;
            ctl.halted = true;
            ctl.shutdown = true;
            self.changed.notify_all();
            ctl.origin
        };

        info!(subsystem = %self.name, "shutdown requested");
        let notified = self.run_hook("on_shutdown", H::on_shutdown, |_| {});

        {
            let mut ctl = self.lock();
            ctl.shutdown_notified = true;
            self.changed.notify_all();
        }
        if origin != State::Created {
            return notified;
        }

        // Never started, so no worker will run the completion half.
        let completed =
            notified.and_then(|()| self.run_hook("after_shutdown", H::after_shutdown, |_| {}));

        let mut ctl = self.lock();
        ctl.loop_exited = true;
        ctl.finished = true;
        match &completed {
            Ok(()) => {
                self.finish_locked(&mut ctl, Transition::Shutdown, CallbackResult::Success)?;
            }
            Err(err) => {
                ctl.state = State::Failed;
                ctl.failure = Some(err.clone());
            }
        }
        self.changed.notify_all();
        completed
    }

    /// Worker side of shutdown, after the execution loop is over.
    ///
    /// Runs `on_shutdown` itself when the subsystem is shutting itself down
    /// (one-shot), otherwise waits for the caller's `on_shutdown` to return so
    /// that `after_shutdown` is always the last hook.
    pub(crate) fn complete_shutdown(&self) -> Result<()> {
        let self_initiated = {
            let mut ctl = self.lock();
            ctl.loop_exited = true;
            self.changed.notify_all();

            if ctl.shutdown {
                false
            } else {
                self.begin_locked(&mut ctl, Transition::Shutdown)?;
                ctl.halted = true;
                ctl.shutdown = true;
                true
            }
        };

        if self_initiated {
            self.hooks.on_shutdown();
        } else {
            let ctl = self.lock();
            drop(self.wait(ctl, |c| !c.shutdown_notified));
        }

        self.hooks.after_shutdown();

        let mut ctl = self.lock();
        ctl.shutdown_notified = true;
        self.finish_locked(&mut ctl, Transition::Shutdown, CallbackResult::Success)?;
        Ok(())
    }

    /// Block until the worker has terminated and return its outcome.
    ///
    /// Must not be called from one of this subsystem's own hooks.
    pub(crate) fn join(&self, timeout: Option<Duration>) -> Result<()> {
        let failure = {
            let ctl = self.lock();
            if ctl.state == State::Created {
                return Err(self.invalid_state("subsystem was never started"));
            }

            let ctl = self.wait_for(ctl, timeout, |c| !c.finished);
            if !ctl.finished {
                let limit = timeout.unwrap_or_default();
                warn!(subsystem = %self.name, "acquire_lock timed out");
                return Err(CoreError::timeout("acquire_lock", limit));
            }
            ctl.failure.clone()
        };

        let mut exit = self.exit.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(result) = exit.as_ref() {
            return result.clone();
        }

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let result = match handle {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(CoreError::worker_panicked(&self.name))),
            None => failure.map_or(Ok(()), Err),
        };

        *exit = Some(result.clone());
        result
    }
}

fn run_worker<H: SubsystemHooks>(shared: &Shared<H>, body: WorkerBody<H>) -> Result<()> {
    let _exit = WorkerExit { shared };

    let result = body(shared);
    if let Err(err) = &result {
        error!(subsystem = %shared.name, "{err}");
        shared.lock().failure = Some(err.clone());
    }
    result
}

/// Marks the worker finished on every exit path, panics included.
struct WorkerExit<'a, H> {
    shared: &'a Shared<H>,
}

impl<H> Drop for WorkerExit<'_, H> {
    fn drop(&mut self) {
        let mut ctl = self.shared.lock();
        if thread::panicking() {
            error!(subsystem = %self.shared.name, "worker panicked");
            if !ctl.state.is_terminal() {
                ctl.state = State::Failed;
            }
            if ctl.failure.is_none() {
                ctl.failure = Some(CoreError::worker_panicked(&self.shared.name));
            }
        }
        ctl.loop_exited = true;
        ctl.finished = true;
        self.shared.changed.notify_all();
    }
}
