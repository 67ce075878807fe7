//! # Shutter host configuration
//!
//! Everything is optional; a missing file section falls back to the values
//! of the reference rig (active-low relay board on pin 8, 57600 baud).
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! baud = 57600
//! settle_ms = 2000
//!
//! [shutter]
//! pin = 8
//! open_level = "low"
//! closed_level = "high"
//!
//! [pulse]
//! default_ms = 1000
//! ```
//!
//! Command-line arguments override file values; the serial port falls back
//! to [`default_port`] when neither names one.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shutter_shared::protocol::MAX_PIN;
use shutter_shared::{Level, PolarityMapping, PulseRequest};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub shutter: ShutterConfig,
    #[serde(default)]
    pub pulse: PulseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Time to wait after opening the port; most boards reset on connect.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_probe_version")]
    pub probe_version: bool,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            settle_ms: default_settle_ms(),
            probe_version: default_probe_version(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

impl SerialConfig {
    pub fn resolved_port(&self) -> String {
        self.port.clone().unwrap_or_else(|| default_port().to_string())
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

/// Pin assignment and polarity of the shutter driver board.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutterConfig {
    #[serde(default = "default_pin")]
    pub pin: u8,
    #[serde(default = "default_open_level")]
    pub open_level: Level,
    #[serde(default = "default_closed_level")]
    pub closed_level: Level,
}

impl Default for ShutterConfig {
    fn default() -> Self {
        Self {
            pin: default_pin(),
            open_level: default_open_level(),
            closed_level: default_closed_level(),
        }
    }
}

impl ShutterConfig {
    pub fn polarity(&self) -> Result<PolarityMapping, ConfigError> {
        Ok(PolarityMapping::new(self.open_level, self.closed_level)?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PulseConfig {
    #[serde(default = "default_pulse_ms")]
    pub default_ms: u64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            default_ms: default_pulse_ms(),
        }
    }
}

impl PulseConfig {
    pub fn default_request(&self) -> Result<PulseRequest, ConfigError> {
        PulseRequest::from_millis(self.default_ms).ok_or(ConfigError::ZeroPulse)
    }
}

/// Values given on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub pin: Option<u8>,
}

impl Config {
    /// Applies command-line values on top of the loaded file and validates
    /// the result.
    pub fn apply_overrides(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(port) = overrides.port {
            self.serial.port = Some(port);
        }
        if let Some(baud) = overrides.baud {
            self.serial.baud = baud;
        }
        if let Some(pin) = overrides.pin {
            self.shutter.pin = pin;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud == 0 {
            return Err(ConfigError::ZeroBaud);
        }
        if self.shutter.pin > MAX_PIN {
            return Err(ConfigError::PinOutOfRange(self.shutter.pin));
        }
        self.shutter.polarity()?;
        self.pulse.default_request()?;
        Ok(())
    }
}

/// Serial port used when neither the command line nor the config file
/// names one.
pub fn default_port() -> &'static str {
    if cfg!(target_os = "windows") {
        "COM3"
    } else if cfg!(target_os = "macos") {
        "/dev/cu.usbmodem101"
    } else {
        "/dev/ttyACM0"
    }
}

fn default_baud() -> u32 { 57600 }
fn default_settle_ms() -> u64 { 2000 }
fn default_probe_version() -> bool { true }
fn default_response_timeout_ms() -> u64 { 1000 }
fn default_pin() -> u8 { 8 }
fn default_open_level() -> Level { PolarityMapping::ACTIVE_LOW.open_level() }
fn default_closed_level() -> Level { PolarityMapping::ACTIVE_LOW.closed_level() }
fn default_pulse_ms() -> u64 { PulseRequest::DEFAULT_MS }

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
