use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::error::{CoreError, Domain, ErrorKind, Result};

use super::{LogSink, TargetGate, TracingSink};

/// Table of named readiness gates shared by cooperating subsystems.
///
/// Share it as `Arc<TargetRegistry>`; there is no process-global instance.
/// Every lookup and mutation is serialized by one registry mutex. Blocking
/// waits happen on the gate itself, after that mutex is released, so a waiter
/// never stalls `register`/`reach`/`clear` for other names.
pub struct TargetRegistry {
    gates: Mutex<HashMap<String, Arc<TargetGate>>>,
    sink: Arc<dyn LogSink>,
}

impl TargetRegistry {
    /// Registry that reports progress through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Insert a new, unreached gate.
    ///
    /// Fails with `DuplicateTarget` if the name is taken; the existing gate is
    /// left untouched.
    pub fn register(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::error()
                .domain(Domain::Target)
                .kind(ErrorKind::InvalidArgument)
                .msg("target name must not be empty")
                .build());
        }

        let mut gates = self.lock();
        if gates.contains_key(&name) {
            return Err(CoreError::duplicate_target(&name));
        }

        debug!(name = %name, "registered target");
        gates.insert(name.clone(), Arc::new(TargetGate::new(name)));
        Ok(())
    }

    /// Mark `name` reached and release all current and future waiters.
    pub fn reach(&self, name: &str) -> Result<()> {
        {
            let gates = self.lock();
            let gate = gates
                .get(name)
                .ok_or_else(|| CoreError::target_not_found(name))?;
            gate.reach()?;
        }

        self.sink.log(&format!("[OK] Reached target: {name}"));
        Ok(())
    }

    /// Wait for `name`.
    ///
    /// - reached: `Ok(true)` immediately
    /// - pending and `block`: suspend until reached, then `Ok(true)`
    /// - pending and `!block`: `Ok(false)` without suspending
    pub fn wait(&self, name: &str, block: bool) -> Result<bool> {
        let gate = self.gate(name)?;
        if gate.is_reached() {
            return Ok(true);
        }
        if !block {
            return Ok(false);
        }

        gate.wait()?;
        Ok(true)
    }

    /// Blocking wait with a deadline. `Ok(false)` when the deadline passes first.
    pub fn wait_timeout(&self, name: &str, timeout: Duration) -> Result<bool> {
        self.gate(name)?.wait_timeout(timeout)
    }

    /// Remove `name` so it can be registered again.
    ///
    /// Threads still blocked on an unreached gate are released with
    /// `TargetNotFound`.
    pub fn clear(&self, name: &str) -> Result<()> {
        let gate = self
            .lock()
            .remove(name)
            .ok_or_else(|| CoreError::target_not_found(name))?;
        gate.retire();

        debug!(name = %name, "cleared target");
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn is_reached(&self, name: &str) -> Result<bool> {
        Ok(self.gate(name)?.is_reached())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn gate(&self, name: &str) -> Result<Arc<TargetGate>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::target_not_found(name))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TargetGate>>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("targets", &self.names())
            .finish_non_exhaustive()
    }
}
