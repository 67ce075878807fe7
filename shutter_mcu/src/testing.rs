use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use shutter_shared::Level;

/// Output pin that remembers every level written to it.
#[derive(Debug, Default)]
pub struct RecordingPin {
    writes: Vec<Level>,
}

impl RecordingPin {
    pub fn with_history(levels: &[Level]) -> Self {
        Self { writes: levels.to_vec() }
    }

    pub fn writes(&self) -> &[Level] {
        &self.writes
    }

    pub fn level(&self) -> Option<Level> {
        self.writes.last().copied()
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.writes.push(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.writes.push(Level::High);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output pin that accepts a fixed number of writes, then fails.
#[derive(Debug)]
pub struct FaultyPin {
    pub remaining: usize,
    pub writes: Vec<Level>,
}

impl ErrorType for FaultyPin {
    type Error = PinFault;
}

impl FaultyPin {
    fn write(&mut self, level: Level) -> Result<(), PinFault> {
        if self.remaining == 0 {
            return Err(PinFault);
        }
        self.remaining -= 1;
        self.writes.push(level);
        Ok(())
    }
}

impl OutputPin for FaultyPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }
}

/// Delay that records requested waits instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_ns: Vec<u64>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_ns.push(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ns.push(ms as u64 * 1_000_000);
    }
}
