use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::error::{CoreError, Result};
use crate::lifecycle::State;

use super::shared::Shared;
use super::{SubsystemHooks, TransitionEvent};

/// A subsystem that runs `execute` exactly once on its own thread and then
/// shuts itself down. There is no halt or resume.
pub struct OneShotSubsystem<H: SubsystemHooks> {
    shared: Arc<Shared<H>>,
}

impl<H: SubsystemHooks> Clone for OneShotSubsystem<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: SubsystemHooks> OneShotSubsystem<H> {
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

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    pub fn last_error(&self) -> Option<CoreError> {
        self.shared.last_error()
    }

    pub fn subscribe_transition_events(&self) -> broadcast::Receiver<TransitionEvent> {
        self.shared.subscribe()
    }

    /// Launch the worker. Fails on every call after the first.
    pub fn start(&self) -> Result<()> {
        self.shared.start(run_once::<H>)
    }

    /// Cut the run short. If `execute` has not started yet it never will.
    pub fn shutdown(&self) -> Result<()> {
        self.shared.shutdown()
    }

    pub fn acquire_lock(&self) -> Result<()> {
        self.shared.join(None)
    }

    pub fn acquire_lock_timeout(&self, timeout: Duration) -> Result<()> {
        self.shared.join(Some(timeout))
    }
}

fn run_once<H: SubsystemHooks>(s: &Shared<H>) -> Result<()> {
    s.initialize()?;

    let shutdown_requested = s.lock().shutdown;
    if !shutdown_requested {
        s.hooks.execute();
    }

    s.complete_shutdown()
}
