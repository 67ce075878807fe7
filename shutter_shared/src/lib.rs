// shutter_shared: domain types and the pin wire protocol, shared by host, simulator, and MCU
#![cfg_attr(not(test), no_std)]

pub mod polarity;
pub mod protocol;
pub mod pulse;

pub use polarity::{Level, PolarityError, PolarityMapping, ShutterState};
pub use pulse::PulseRequest;
