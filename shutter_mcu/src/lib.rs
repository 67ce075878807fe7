// shutter_mcu: device-side shutter control, generic over embedded-hal pins
//
// Two firmware shapes are supported:
// - `bridge::Bridge`: a host drives the pin over the serial pin protocol
// - `cycle::run_fixed_cycle`: standalone wiring check, no host link
#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bridge;
pub mod controller;
pub mod cycle;

pub use bridge::Bridge;
pub use controller::ShutterController;
pub use cycle::{CycleStep, CycleTiming, FixedCycle, run_fixed_cycle};
pub use shutter_shared::{Level, PolarityMapping, ShutterState};

#[cfg(test)]
mod testing;
