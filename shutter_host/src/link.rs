//! Host end of the pin link.
//!
//! [`PinLink`] is the seam between the session and the transport: claim a
//! pin as a digital output, write a level to it, and release the link.
//! [`FirmataLink`] implements it over any async byte stream (a serial port,
//! or the in-memory stream of the simulated board).

use std::time::Duration;

use async_trait::async_trait;
use shutter_shared::Level;
use shutter_shared::protocol::{self, Frame, Message, PIN_MODE_OUTPUT};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransportError;

#[async_trait]
pub trait PinLink: Send {
    async fn configure_output(&mut self, pin: u8) -> Result<(), TransportError>;

    async fn write_level(&mut self, pin: u8, level: Level) -> Result<(), TransportError>;

    /// Asks the board for its protocol version.
    async fn probe_version(&mut self, timeout: Duration) -> Result<(u8, u8), TransportError>;

    /// Releases the link. Every later write fails with `NotConnected`.
    async fn close(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;
}

/// Firmata framing over an async stream.
///
/// Digital writes are whole-port messages, so the output value of every
/// port touched so far is tracked here.
pub struct FirmataLink<S> {
    name: String,
    stream: Option<S>,
    port_values: [u8; 16],
}

impl<S> FirmataLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stream: Some(stream),
            port_values: [0; 16],
        }
    }

    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        tracing::trace!("{} <- {:02X?}", self.name, frame.as_bytes());
        stream.write_all(frame.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<S> PinLink for FirmataLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn configure_output(&mut self, pin: u8) -> Result<(), TransportError> {
        tracing::debug!("Configuring pin {} as digital output", pin);
        self.send(Message::SetPinMode { pin, mode: PIN_MODE_OUTPUT }.encode()).await
    }

    async fn write_level(&mut self, pin: u8, level: Level) -> Result<(), TransportError> {
        let port = protocol::port_of(pin);
        let bit = protocol::port_bit(pin);
        let current = self.port_values[port as usize];
        let value = match level {
            Level::High => current | bit,
            Level::Low => current & !bit,
        };
        tracing::debug!("Pin {} -> {}", pin, level);
        self.send(Message::DigitalPort { port, value }.encode()).await?;
        self.port_values[port as usize] = value;
        Ok(())
    }

    async fn probe_version(&mut self, timeout: Duration) -> Result<(u8, u8), TransportError> {
        self.send(Message::VersionQuery.encode()).await?;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;
        let version = tokio::time::timeout(timeout, read_version(stream))
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(version)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut stream) = self.stream.take() {
            tracing::info!("Releasing link to {}", self.name);
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

/// Boards may emit unrelated traffic first; everything up to the version
/// reply is skipped.
async fn read_version<R>(stream: &mut R) -> std::io::Result<(u8, u8)>
where
    R: AsyncRead + Unpin,
{
    loop {
        if stream.read_u8().await? == protocol::REPORT_VERSION {
            let major = stream.read_u8().await?;
            let minor = stream.read_u8().await?;
            return Ok((major, minor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn writes_pin_mode_and_port_values() {
        let mock = Builder::new()
            .write(&[0xF4, 8, 1])
            .write(&[0x91, 0x01, 0x00])
            .write(&[0x91, 0x00, 0x00])
            .build();
        let mut link = FirmataLink::new(mock, "mock");
        link.configure_output(8).await.unwrap();
        link.write_level(8, Level::High).await.unwrap();
        link.write_level(8, Level::Low).await.unwrap();
    }

    #[tokio::test]
    async fn port_value_keeps_other_bits_of_the_port() {
        let mock = Builder::new()
            .write(&[0x90, 0x00, 0x01])
            .write(&[0x90, 0x20, 0x01])
            .write(&[0x90, 0x20, 0x00])
            .build();
        let mut link = FirmataLink::new(mock, "mock");
        link.write_level(7, Level::High).await.unwrap();
        link.write_level(5, Level::High).await.unwrap();
        link.write_level(7, Level::Low).await.unwrap();
    }

    #[tokio::test]
    async fn probe_skips_unrelated_bytes() {
        let mock = Builder::new()
            .write(&[0xF9])
            .read(&[0xF0, 0x79, 0xF7, 0xF9, 2, 5])
            .build();
        let mut link = FirmataLink::new(mock, "mock");
        assert_eq!(link.probe_version(Duration::from_secs(1)).await.unwrap(), (2, 5));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_times_out_on_silent_board() {
        let (host, _board) = tokio::io::duplex(64);
        let mut link = FirmataLink::new(host, "silent");
        let err = link.probe_version(Duration::from_millis(500)).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
    }

    #[tokio::test]
    async fn writes_fail_after_close() {
        let (host, _board) = tokio::io::duplex(64);
        let mut link = FirmataLink::new(host, "duplex");
        assert!(link.is_open());
        link.close().await.unwrap();
        link.close().await.unwrap();
        assert!(!link.is_open());
        let err = link.write_level(8, Level::High).await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn write_error_surfaces_as_transport_error() {
        let (host, board) = tokio::io::duplex(64);
        drop(board);
        let mut link = FirmataLink::new(host, "broken");
        let err = link.configure_output(8).await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
