use core::num::NonZeroU64;
use core::time::Duration;

/// A single open-wait-close request. Durations are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseRequest {
    duration_ms: NonZeroU64,
}

impl PulseRequest {
    pub const DEFAULT_MS: u64 = 1000;

    pub const DEFAULT: Self = match NonZeroU64::new(Self::DEFAULT_MS) {
        Some(duration_ms) => Self { duration_ms },
        None => panic!("default pulse must be positive"),
    };

    /// Returns `None` for a zero duration.
    pub fn from_millis(ms: u64) -> Option<Self> {
        NonZeroU64::new(ms).map(|duration_ms| Self { duration_ms })
    }

    pub fn as_millis(&self) -> u64 {
        self.duration_ms.get()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.get())
    }
}

impl Default for PulseRequest {
    fn default() -> Self {
        Self::DEFAULT
    }
}
