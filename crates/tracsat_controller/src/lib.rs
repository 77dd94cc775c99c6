//! tracsat_controller: demonstration wiring of TracSat subsystems.
//!
//! A continuous `Telemetry` subsystem waits on a readiness target that a
//! one-shot `LinkBringUp` subsystem reaches.

pub mod config;
pub mod demo;
pub mod error;
