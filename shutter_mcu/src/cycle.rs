//! Standalone exposure cycle used to check wiring without a host.
//!
//! The cycle is a pure state machine: an endless sequence of
//! OPEN-for-exposure, CLOSED-for-gap steps. [`run_fixed_cycle`] is the
//! scheduler that applies each step and waits out its hold time.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use shutter_shared::ShutterState;

use crate::controller::ShutterController;

/// Hold times for the two phases, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    pub exposure_ms: u32,
    pub gap_ms: u32,
}

impl CycleTiming {
    pub const DEFAULT: Self = Self {
        exposure_ms: 1000,
        gap_ms: 1000,
    };
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One scheduler step: drive `state`, then hold it for `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStep {
    pub state: ShutterState,
    pub hold_ms: u32,
}

#[derive(Debug, Clone)]
pub struct FixedCycle {
    timing: CycleTiming,
    next: ShutterState,
}

impl FixedCycle {
    /// Starts with the exposure phase.
    pub fn new(timing: CycleTiming) -> Self {
        Self {
            timing,
            next: ShutterState::Open,
        }
    }

    pub fn next_step(&mut self) -> CycleStep {
        let state = self.next;
        self.next = state.inverse();
        let hold_ms = match state {
            ShutterState::Open => self.timing.exposure_ms,
            ShutterState::Closed => self.timing.gap_ms,
        };
        CycleStep { state, hold_ms }
    }
}

impl Iterator for FixedCycle {
    type Item = CycleStep;

    fn next(&mut self) -> Option<CycleStep> {
        Some(self.next_step())
    }
}

/// Runs the cycle forever. Returns only if the pin reports an error.
pub fn run_fixed_cycle<P, D>(
    controller: &mut ShutterController<P>,
    delay: &mut D,
    mut cycle: FixedCycle,
) -> Result<Infallible, P::Error>
where
    P: OutputPin,
    D: DelayNs,
{
    loop {
        let step = cycle.next_step();
        controller.set_state(step.state)?;
        delay.delay_ms(step.hold_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FaultyPin, PinFault, RecordingDelay};
    use shutter_shared::{Level, PolarityMapping};

    #[test]
    fn alternates_exposure_and_gap() {
        let timing = CycleTiming {
            exposure_ms: 250,
            gap_ms: 4000,
        };
        let steps: Vec<CycleStep> = FixedCycle::new(timing).take(4).collect();
        assert_eq!(
            steps,
            vec![
                CycleStep { state: ShutterState::Open, hold_ms: 250 },
                CycleStep { state: ShutterState::Closed, hold_ms: 4000 },
                CycleStep { state: ShutterState::Open, hold_ms: 250 },
                CycleStep { state: ShutterState::Closed, hold_ms: 4000 },
            ]
        );
    }

    #[test]
    fn scheduler_drives_pin_then_waits_each_step() {
        // One write for initialize, then three cycle steps before the fault.
        let pin = FaultyPin {
            remaining: 4,
            writes: Vec::new(),
        };
        let mut controller = ShutterController::initialize(pin, PolarityMapping::ACTIVE_LOW).unwrap();
        let mut delay = RecordingDelay::default();

        let result = run_fixed_cycle(&mut controller, &mut delay, FixedCycle::new(CycleTiming::DEFAULT));

        assert_eq!(result.unwrap_err(), PinFault);
        assert_eq!(delay.waits_ns, vec![1_000_000_000; 3]);
        assert_eq!(
            controller.release().writes,
            vec![Level::High, Level::Low, Level::High, Level::Low]
        );
    }
}
