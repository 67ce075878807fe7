//! Shutter output pin driver.
//!
//! Maps the two logical shutter states onto a single digital output through
//! a fixed [`PolarityMapping`]. The pin is driven CLOSED as part of
//! construction, so no command can observe an uninitialized shutter.

use embedded_hal::digital::{OutputPin, PinState};
use shutter_shared::{Level, PolarityMapping, ShutterState};

pub struct ShutterController<P> {
    pin: P,
    polarity: PolarityMapping,
    state: ShutterState,
}

impl<P: OutputPin> ShutterController<P> {
    /// Takes a pin already configured as a digital output and drives it to
    /// the closed level.
    pub fn initialize(pin: P, polarity: PolarityMapping) -> Result<Self, P::Error> {
        let mut controller = Self {
            pin,
            polarity,
            state: ShutterState::Closed,
        };
        controller.reinitialize()?;
        Ok(controller)
    }

    /// Drives the pin for `state`. The level is written on every call, so
    /// repeating a state is harmless and a change is never skipped.
    pub fn set_state(&mut self, state: ShutterState) -> Result<(), P::Error> {
        let level = self.polarity.level(state);
        self.pin.set_state(PinState::from(level.is_high()))?;
        self.state = state;
        Ok(())
    }

    /// Returns the shutter to CLOSED. Used again when the host reclaims the
    /// pin after a reconnect.
    pub fn reinitialize(&mut self) -> Result<(), P::Error> {
        self.set_state(ShutterState::Closed)
    }

    pub fn state(&self) -> ShutterState {
        self.state
    }

    pub fn level(&self) -> Level {
        self.polarity.level(self.state)
    }

    pub fn polarity(&self) -> PolarityMapping {
        self.polarity
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPin;

    #[test]
    fn initialize_drives_closed_level_regardless_of_history() {
        for polarity in [PolarityMapping::ACTIVE_LOW, PolarityMapping::ACTIVE_HIGH] {
            let pin = RecordingPin::with_history(&[Level::Low, Level::High, Level::Low]);
            let controller = ShutterController::initialize(pin, polarity).unwrap();
            assert_eq!(controller.state(), ShutterState::Closed);
            let pin = controller.release();
            assert_eq!(pin.level(), Some(polarity.closed_level()));
        }
    }

    #[test]
    fn repeated_state_is_idempotent() {
        let pin = RecordingPin::default();
        let mut controller =
            ShutterController::initialize(pin, PolarityMapping::ACTIVE_LOW).unwrap();
        controller.set_state(ShutterState::Open).unwrap();
        let once = controller.level();
        controller.set_state(ShutterState::Open).unwrap();
        assert_eq!(controller.level(), once);
        let pin = controller.release();
        assert_eq!(pin.level(), Some(Level::Low));
        assert_eq!(pin.writes(), &[Level::High, Level::Low, Level::Low]);
    }

    #[test]
    fn every_state_change_changes_level() {
        let pin = RecordingPin::default();
        let mut controller =
            ShutterController::initialize(pin, PolarityMapping::ACTIVE_HIGH).unwrap();
        let sequence = [
            ShutterState::Open,
            ShutterState::Closed,
            ShutterState::Open,
            ShutterState::Closed,
        ];
        for state in sequence {
            controller.set_state(state).unwrap();
        }
        let writes = controller.release().writes().to_vec();
        for pair in writes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(writes.len(), sequence.len() + 1);
    }

    #[test]
    fn reinitialize_closes_an_open_shutter() {
        let mut controller =
            ShutterController::initialize(RecordingPin::default(), PolarityMapping::ACTIVE_LOW)
                .unwrap();
        controller.set_state(ShutterState::Open).unwrap();
        controller.reinitialize().unwrap();
        controller.reinitialize().unwrap();
        assert_eq!(controller.state(), ShutterState::Closed);
        assert_eq!(controller.release().level(), Some(Level::High));
    }
}
