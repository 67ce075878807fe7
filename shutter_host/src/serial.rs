//! Serial port transport for a real board.

use serial2_tokio::SerialPort;

use crate::error::SessionError;
use crate::link::FirmataLink;

/// Opens `port` at `baud`. No retry; a board that is not there is a
/// startup error.
pub fn open_port(port: &str, baud: u32) -> Result<FirmataLink<SerialPort>, SessionError> {
    tracing::info!("Connecting to board on {} at {} baud", port, baud);
    let serial = SerialPort::open(port, baud).map_err(|source| SessionError::Connection {
        port: port.to_string(),
        source,
    })?;
    tracing::info!("Connected to {}", port);
    Ok(FirmataLink::new(serial, port))
}
