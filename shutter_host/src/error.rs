use shutter_shared::PolarityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid polarity: {0}")]
    Polarity(#[from] PolarityError),
    #[error("shutter pin {0} is out of range (0-127)")]
    PinOutOfRange(u8),
    #[error("baud rate must be greater than zero")]
    ZeroBaud,
    #[error("default pulse must be a positive number of milliseconds")]
    ZeroPulse,
}

/// Failures of the serial link once a session is running.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not connected to board")]
    NotConnected,
    #[error("Timeout waiting for board response")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open serial port '{port}': {source}")]
    Connection {
        port: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("console error: {0}")]
    Console(#[from] std::io::Error),
}

/// A recoverable problem with user input; the session reports it and
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Invalid ms {given:?}; using default {default_ms}.")]
    InvalidDuration { given: String, default_ms: u64 },
}
