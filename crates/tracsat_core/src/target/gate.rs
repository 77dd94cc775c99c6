use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{CoreError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum GateStatus {
    Pending,
    Reached,
    /// Removed from its registry before being reached.
    Retired,
}

/// A named, one-shot readiness signal.
///
/// Any number of threads may block on the gate; all of them are released
/// together when it is reached. Reaching is monotonic: once reached the gate
/// stays reached, even after being removed from its registry.
#[derive(Debug)]
pub struct TargetGate {
    name: String,
    status: Mutex<GateStatus>,
    changed: Condvar,
}

impl TargetGate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Mutex::new(GateStatus::Pending),
            changed: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_reached(&self) -> bool {
        *self.lock() == GateStatus::Reached
    }

    /// Mark the gate reached and release every waiter.
    pub(crate) fn reach(&self) -> Result<()> {
        let mut status = self.lock();
        match *status {
            GateStatus::Pending => {
                *status = GateStatus::Reached;
                self.changed.notify_all();
                Ok(())
            }
            GateStatus::Reached => Err(CoreError::target_already_reached(&self.name)),
            GateStatus::Retired => Err(CoreError::target_not_found(&self.name)),
        }
    }

    /// Release waiters of a gate that is being removed unreached.
    pub(crate) fn retire(&self) {
        let mut status = self.lock();
        if *status == GateStatus::Pending {
            *status = GateStatus::Retired;
            self.changed.notify_all();
        }
    }

    /// Block until reached.
    pub fn wait(&self) -> Result<()> {
        let status = self
            .changed
            .wait_while(self.lock(), |s| *s == GateStatus::Pending)
            .unwrap_or_else(PoisonError::into_inner);

        match *status {
            GateStatus::Reached => Ok(()),
            _ => Err(CoreError::target_not_found(&self.name)),
        }
    }

    /// Block until reached or until `timeout` elapses. `Ok(false)` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        let (status, _) = self
            .changed
            .wait_timeout_while(self.lock(), timeout, |s| *s == GateStatus::Pending)
            .unwrap_or_else(PoisonError::into_inner);

        match *status {
            GateStatus::Reached => Ok(true),
            GateStatus::Pending => Ok(false),
            GateStatus::Retired => Err(CoreError::target_not_found(&self.name)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateStatus> {
        // Hooks never run under this lock, so a poisoned guard still holds a
        // consistent status.
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
