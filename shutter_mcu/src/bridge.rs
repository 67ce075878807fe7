//! Host-linked firmware: applies pin protocol messages to the shutter pin.
//!
//! The bridge owns exactly one output pin. Messages addressing other pins
//! are ignored. Incoming digital levels are applied through the controller,
//! so the electrical level always equals what the host asked for while the
//! controller keeps track of the logical state.

use embedded_hal::digital::OutputPin;
use shutter_shared::protocol::{
    self, CommandDecoder, Frame, Message, PIN_MODE_OUTPUT, PROTOCOL_VERSION,
};
use shutter_shared::{Level, PolarityMapping, ShutterState};

use crate::controller::ShutterController;

pub struct Bridge<P> {
    controller: ShutterController<P>,
    pin_number: u8,
    decoder: CommandDecoder,
}

impl<P: OutputPin> Bridge<P> {
    /// Initializes the shutter pin CLOSED before any message is accepted.
    pub fn new(pin: P, pin_number: u8, polarity: PolarityMapping) -> Result<Self, P::Error> {
        Ok(Self {
            controller: ShutterController::initialize(pin, polarity)?,
            pin_number,
            decoder: CommandDecoder::new(),
        })
    }

    pub fn pin_number(&self) -> u8 {
        self.pin_number
    }

    pub fn controller(&self) -> &ShutterController<P> {
        &self.controller
    }

    pub fn state(&self) -> ShutterState {
        self.controller.state()
    }

    /// Feeds one received byte. Returns a reply frame to send back, if any.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, P::Error> {
        match self.decoder.push(byte) {
            Some(message) => self.handle(message),
            None => Ok(None),
        }
    }

    pub fn handle(&mut self, message: Message) -> Result<Option<Frame>, P::Error> {
        match message {
            Message::SetPinMode { pin, mode } if pin == self.pin_number && mode == PIN_MODE_OUTPUT => {
                self.controller.reinitialize()?;
            }
            Message::SetPinMode { .. } => {}
            Message::DigitalPort { port, value } if port == protocol::port_of(self.pin_number) => {
                let high = value & protocol::port_bit(self.pin_number) != 0;
                self.apply_level(Level::from(high))?;
            }
            Message::DigitalPort { .. } => {}
            Message::SetDigitalPinValue { pin, level } if pin == self.pin_number => {
                self.apply_level(level)?;
            }
            Message::SetDigitalPinValue { .. } => {}
            Message::VersionQuery => {
                let (major, minor) = PROTOCOL_VERSION;
                return Ok(Some(protocol::version_reply(major, minor)));
            }
            Message::SystemReset => {
                self.decoder.reset();
                self.controller.reinitialize()?;
            }
        }
        Ok(None)
    }

    fn apply_level(&mut self, level: Level) -> Result<(), P::Error> {
        let state = self.controller.polarity().state_for(level);
        self.controller.set_state(state)
    }

    pub fn release(self) -> P {
        self.controller.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPin;

    fn feed_all(bridge: &mut Bridge<RecordingPin>, bytes: &[u8]) -> Vec<u8> {
        let mut replies = Vec::new();
        for &b in bytes {
            if let Some(frame) = bridge.feed(b).unwrap() {
                replies.extend_from_slice(frame.as_bytes());
            }
        }
        replies
    }

    #[test]
    fn starts_closed() {
        let bridge = Bridge::new(RecordingPin::default(), 8, PolarityMapping::ACTIVE_LOW).unwrap();
        assert_eq!(bridge.state(), ShutterState::Closed);
        assert_eq!(bridge.release().writes(), &[Level::High]);
    }

    #[test]
    fn port_write_for_own_pin_sets_level() {
        let mut bridge =
            Bridge::new(RecordingPin::default(), 8, PolarityMapping::ACTIVE_LOW).unwrap();
        // Pin 8 low: open for an active-low board.
        feed_all(&mut bridge, &[0x91, 0x00, 0x00]);
        assert_eq!(bridge.state(), ShutterState::Open);
        feed_all(&mut bridge, &[0x91, 0x01, 0x00]);
        assert_eq!(bridge.state(), ShutterState::Closed);
        assert_eq!(
            bridge.release().writes(),
            &[Level::High, Level::Low, Level::High]
        );
    }

    #[test]
    fn single_pin_write_sets_level() {
        let mut bridge =
            Bridge::new(RecordingPin::default(), 3, PolarityMapping::ACTIVE_HIGH).unwrap();
        feed_all(&mut bridge, &[0xF5, 3, 1]);
        assert_eq!(bridge.state(), ShutterState::Open);
        assert_eq!(bridge.controller().level(), Level::High);
    }

    #[test]
    fn ignores_other_pins_and_ports() {
        let mut bridge =
            Bridge::new(RecordingPin::default(), 8, PolarityMapping::ACTIVE_LOW).unwrap();
        feed_all(&mut bridge, &[0x90, 0x00, 0x00, 0xF5, 9, 0, 0xF4, 13, 1]);
        // Port 1 write that leaves pin 8 high.
        feed_all(&mut bridge, &[0x91, 0x03, 0x00]);
        assert_eq!(bridge.state(), ShutterState::Closed);
        assert_eq!(bridge.release().writes(), &[Level::High, Level::High]);
    }

    #[test]
    fn repeated_configure_output_recloses() {
        let mut bridge =
            Bridge::new(RecordingPin::default(), 8, PolarityMapping::ACTIVE_LOW).unwrap();
        feed_all(&mut bridge, &[0xF4, 8, 1, 0x91, 0x00, 0x00]);
        assert_eq!(bridge.state(), ShutterState::Open);
        feed_all(&mut bridge, &[0xF4, 8, 1]);
        assert_eq!(bridge.state(), ShutterState::Closed);
        feed_all(&mut bridge, &[0xF4, 8, 1]);
        assert_eq!(bridge.state(), ShutterState::Closed);
    }

    #[test]
    fn answers_version_query_and_resets() {
        let mut bridge =
            Bridge::new(RecordingPin::default(), 8, PolarityMapping::ACTIVE_LOW).unwrap();
        assert_eq!(feed_all(&mut bridge, &[0xF9]), vec![0xF9, 2, 5]);
        feed_all(&mut bridge, &[0xF5, 8, 0]);
        assert_eq!(bridge.state(), ShutterState::Open);
        feed_all(&mut bridge, &[0xFF]);
        assert_eq!(bridge.state(), ShutterState::Closed);
    }
}
