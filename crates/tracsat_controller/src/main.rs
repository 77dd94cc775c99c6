use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracsat_controller::config::Config;
use tracsat_controller::demo;

fn main() -> Result<()> {
    let config = Config::from_args().context("parse configuration")?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("invalid log filter {:?}", config.log_filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        run_ms = config.run_for.as_millis() as u64,
        ready_target = %config.ready_target,
        halt_demo = config.halt_demo,
        "controller started"
    );

    let report = demo::run(&config)?;

    info!(ticks = report.ticks, halted = report.halted, "controller finished");
    Ok(())
}
