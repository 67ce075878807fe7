//! Logical shutter states and their mapping onto electrical pin levels.

use core::fmt;
use thiserror::Error;

/// Logical position of the shutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShutterState {
    Open,
    Closed,
}

impl ShutterState {
    pub fn inverse(self) -> Self {
        match self {
            ShutterState::Open => ShutterState::Closed,
            ShutterState::Closed => ShutterState::Open,
        }
    }
}

impl fmt::Display for ShutterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutterState::Open => f.write_str("OPEN"),
            ShutterState::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    pub fn inverse(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => f.write_str("LOW"),
            Level::High => f.write_str("HIGH"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolarityError {
    #[error("open and closed levels must differ (both are {0})")]
    SameLevel(Level),
}

/// Deployment-specific association between shutter states and pin levels.
///
/// The two levels always differ, so the mapping is a bijection: for every
/// level `l`, `mapping.level(mapping.state_for(l)) == l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolarityMapping {
    open: Level,
    closed: Level,
}

impl PolarityMapping {
    /// Relay boards that energize on a low input: OPEN = LOW, CLOSED = HIGH.
    pub const ACTIVE_LOW: Self = Self { open: Level::Low, closed: Level::High };
    /// OPEN = HIGH, CLOSED = LOW.
    pub const ACTIVE_HIGH: Self = Self { open: Level::High, closed: Level::Low };

    pub fn new(open: Level, closed: Level) -> Result<Self, PolarityError> {
        if open == closed {
            return Err(PolarityError::SameLevel(open));
        }
        Ok(Self { open, closed })
    }

    pub fn open_level(&self) -> Level {
        self.open
    }

    pub fn closed_level(&self) -> Level {
        self.closed
    }

    pub fn level(&self, state: ShutterState) -> Level {
        match state {
            ShutterState::Open => self.open,
            ShutterState::Closed => self.closed,
        }
    }

    pub fn state_for(&self, level: Level) -> ShutterState {
        if level == self.open {
            ShutterState::Open
        } else {
            ShutterState::Closed
        }
    }
}

impl Default for PolarityMapping {
    fn default() -> Self {
        Self::ACTIVE_LOW
    }
}
