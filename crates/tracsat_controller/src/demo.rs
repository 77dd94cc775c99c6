use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracsat_core::error::ErrorKind;
use tracsat_core::{
    ContinuousSubsystem, OneShotSubsystem, State, SubsystemHooks, TargetRegistry, Transition,
    TransitionEvent,
};

use crate::config::Config;
use crate::error::{log_cleanup, log_core_error};

const TICK: Duration = Duration::from_millis(10);
const HALT_PAUSE: Duration = Duration::from_millis(100);

/// Continuous subsystem that counts telemetry ticks once the link is ready.
pub struct Telemetry {
    registry: Arc<TargetRegistry>,
    ready_target: String,
    ticks: AtomicU64,
}

impl Telemetry {
    pub fn new(registry: Arc<TargetRegistry>, ready_target: impl Into<String>) -> Self {
        Self {
            registry,
            ready_target: ready_target.into(),
            ticks: AtomicU64::new(0),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl SubsystemHooks for Telemetry {
    fn initialize(&self) -> bool {
        info!(target_name = %self.ready_target, "telemetry waiting for link");
        match self.registry.wait(&self.ready_target, true) {
            Ok(reached) => reached,
            Err(err) => {
                log_core_error(&err);
                false
            }
        }
    }

    fn execute(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        thread::sleep(TICK);
    }

    fn on_halt(&self) {
        info!("telemetry halting");
    }

    fn after_halt(&self) {
        info!(ticks = self.ticks(), "telemetry halted");
    }

    fn on_resume(&self) {
        info!("telemetry resuming");
    }

    fn on_shutdown(&self) {
        info!("telemetry shutting down");
    }

    fn after_shutdown(&self) {
        info!(ticks = self.ticks(), "telemetry stopped");
    }
}

/// One-shot subsystem that brings the link up and announces readiness.
pub struct LinkBringUp {
    registry: Arc<TargetRegistry>,
    ready_target: String,
}

impl LinkBringUp {
    pub fn new(registry: Arc<TargetRegistry>, ready_target: impl Into<String>) -> Self {
        Self {
            registry,
            ready_target: ready_target.into(),
        }
    }
}

impl SubsystemHooks for LinkBringUp {
    fn initialize(&self) -> bool {
        true
    }

    fn execute(&self) {
        if let Err(err) = self.registry.reach(&self.ready_target) {
            log_core_error(&err);
        }
    }
}

/// Outcome of a demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub ticks: u64,
    /// Whether the halt/resume cycle completed.
    pub halted: bool,
}

/// Start both subsystems, optionally exercise halt/resume, run for
/// `config.run_for`, then shut everything down.
pub fn run(config: &Config) -> Result<Report> {
    let registry = Arc::new(TargetRegistry::new());
    registry
        .register(config.ready_target.as_str())
        .context("register ready target")?;

    let telemetry = ContinuousSubsystem::new(
        "Telemetry",
        Telemetry::new(Arc::clone(&registry), config.ready_target.as_str()),
    )?;
    let link = OneShotSubsystem::new(
        "LinkBringUp",
        LinkBringUp::new(Arc::clone(&registry), config.ready_target.as_str()),
    )?;

    let mut events = telemetry.subscribe_transition_events();
    telemetry.start().context("start Telemetry")?;
    link.start().context("start LinkBringUp")?;

    if let Err(err) = link.acquire_lock() {
        // Release Telemetry from its wait so its worker can exit.
        log_cleanup("clear ready target", registry.clear(&config.ready_target));
        log_cleanup("join Telemetry", telemetry.acquire_lock());
        return Err(err).context("LinkBringUp did not complete");
    }

    let started = wait_for_start(&mut events)?;
    if started != State::Running {
        telemetry.acquire_lock().context("Telemetry failed to start")?;
        bail!("Telemetry ended in {started} after start");
    }

    let halted = if config.halt_demo {
        halt_cycle(&telemetry, config.halt_timeout)?
    } else {
        false
    };

    thread::sleep(config.run_for);

    telemetry.shutdown().context("shut down Telemetry")?;
    telemetry.acquire_lock().context("Telemetry failed")?;

    Ok(Report {
        ticks: telemetry.hooks().ticks(),
        halted,
    })
}

fn wait_for_start(events: &mut broadcast::Receiver<TransitionEvent>) -> Result<State> {
    loop {
        match events.blocking_recv() {
            Ok(ev) if ev.transition == Transition::Start => return Ok(ev.goal_state),
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "missed transition events"),
            Err(RecvError::Closed) => bail!("transition events closed before start completed"),
        }
    }
}

fn halt_cycle(
    telemetry: &ContinuousSubsystem<Telemetry>,
    timeout: Option<Duration>,
) -> Result<bool> {
    let halted = match timeout {
        Some(limit) => telemetry.halt_timeout(limit),
        None => telemetry.halt(),
    };

    match halted {
        Ok(()) => {
            let frozen = telemetry.hooks().ticks();
            thread::sleep(HALT_PAUSE);
            info!(
                frozen,
                now = telemetry.hooks().ticks(),
                "tick count while halted"
            );
            telemetry.resume().context("resume Telemetry")?;
            Ok(true)
        }
        Err(err) if err.kind == ErrorKind::Timeout => {
            log_core_error(&err);
            Ok(false)
        }
        Err(err) => Err(err).context("halt Telemetry"),
    }
}
