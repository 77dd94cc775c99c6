use std::sync::Arc;
use std::time::Duration;

use tracsat_controller::config::Config;
use tracsat_controller::demo::{self, LinkBringUp, Telemetry};
use tracsat_core::{ContinuousSubsystem, OneShotSubsystem, State, TargetRegistry};

fn config(halt_demo: bool) -> Config {
    Config {
        run_for: Duration::from_millis(50),
        halt_timeout: None,
        ready_target: "net.ready".to_string(),
        halt_demo,
        log_filter: "info".to_string(),
    }
}

#[test]
fn demo_run_ticks_and_halts() {
    let report = demo::run(&config(true)).unwrap();
    assert!(report.halted);
    assert!(report.ticks > 0);
}

#[test]
fn demo_run_without_halt_cycle() {
    let report = demo::run(&config(false)).unwrap();
    assert!(!report.halted);
    assert!(report.ticks > 0);
}

#[test]
fn telemetry_stays_idle_until_link_is_up() {
    let registry = Arc::new(TargetRegistry::new());
    registry.register("net.ready").unwrap();

    let telemetry = ContinuousSubsystem::new(
        "Telemetry",
        Telemetry::new(Arc::clone(&registry), "net.ready"),
    )
    .unwrap();
    telemetry.start().unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(telemetry.hooks().ticks(), 0);

    let link = OneShotSubsystem::new(
        "LinkBringUp",
        LinkBringUp::new(Arc::clone(&registry), "net.ready"),
    )
    .unwrap();
    link.start().unwrap();
    link.acquire_lock().unwrap();
    assert_eq!(link.state(), State::Shutdown);

    telemetry.shutdown().unwrap();
    telemetry.acquire_lock().unwrap();
    assert!(registry.is_reached("net.ready").unwrap());
}

#[test]
fn cleared_ready_target_fails_telemetry() {
    let registry = Arc::new(TargetRegistry::new());
    registry.register("net.ready").unwrap();

    let telemetry = ContinuousSubsystem::new(
        "Telemetry",
        Telemetry::new(Arc::clone(&registry), "net.ready"),
    )
    .unwrap();
    telemetry.start().unwrap();
    std::thread::sleep(Duration::from_millis(20));

    registry.clear("net.ready").unwrap();
    assert!(telemetry.acquire_lock().is_err());
    assert_eq!(telemetry.state(), State::Failed);
}
