/// Behaviour a concrete subsystem plugs into the lifecycle driver.
///
/// Hooks take `&self` because they are invoked from two threads: `initialize`,
/// `execute` and `after_shutdown` run on the subsystem's worker, while
/// `on_halt`, `after_halt`, `on_resume` and `on_shutdown` run on whichever
/// thread called the matching operation. Keep mutable state behind atomics or
/// locks.
///
/// A caller-side hook that panics makes its operation return `HookPanicked`;
/// the lifecycle is rolled back (halt, resume) or carried on (shutdown).
///
/// No hook is ever called while the driver holds its internal lock, so hooks
/// may freely call back into the subsystem's read-only accessors or into a
/// `TargetRegistry`.
pub trait SubsystemHooks: Send + Sync + 'static {
    /// Runs once on the worker before the first `execute`.
    ///
    /// Returning `false` stops the subsystem for good: the state becomes
    /// `Failed` and no other hook runs.
    fn initialize(&self) -> bool;

    /// One unit of work. Continuous subsystems call it repeatedly while
    /// running; one-shot subsystems call it exactly once.
    fn execute(&self);

    /// Halt requested. `execute` may still be finishing its current call.
    fn on_halt(&self) {}

    /// Halt acknowledged; `execute` is not running and will not start until
    /// resumed.
    fn after_halt(&self) {}

    /// Runs before execution resumes.
    fn on_resume(&self) {}

    /// Shutdown requested. The worker may still have one iteration left.
    fn on_shutdown(&self) {}

    /// Last hook on the worker thread; `execute` has stopped for good.
    fn after_shutdown(&self) {}
}
