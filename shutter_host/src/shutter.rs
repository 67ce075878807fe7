//! Host-side view of the remote shutter.

use shutter_shared::{PolarityMapping, PulseRequest, ShutterState};

use crate::error::TransportError;
use crate::link::PinLink;
use crate::timer::{Countdown, CountdownOutcome};

/// Owns the link and knows which pin and polarity drive the shutter.
pub struct Shutter<L> {
    link: L,
    pin: u8,
    polarity: PolarityMapping,
    state: ShutterState,
}

impl<L: PinLink> Shutter<L> {
    /// Claims `pin` as an output exactly once and drives it CLOSED.
    pub async fn attach(
        mut link: L,
        pin: u8,
        polarity: PolarityMapping,
    ) -> Result<Self, TransportError> {
        link.configure_output(pin).await?;
        link.write_level(pin, polarity.level(ShutterState::Closed)).await?;
        tracing::info!("Shutter on pin {} ready (CLOSED)", pin);
        Ok(Self {
            link,
            pin,
            polarity,
            state: ShutterState::Closed,
        })
    }

    pub async fn set_state(&mut self, state: ShutterState) -> Result<(), TransportError> {
        self.link.write_level(self.pin, self.polarity.level(state)).await?;
        self.state = state;
        Ok(())
    }

    pub async fn open(&mut self) -> Result<(), TransportError> {
        self.set_state(ShutterState::Open).await
    }

    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.set_state(ShutterState::Closed).await
    }

    pub async fn pulse(&mut self, request: PulseRequest) -> Result<CountdownOutcome, TransportError> {
        self.pulse_with(Countdown::new(request.duration())).await
    }

    /// Opens, waits for `countdown`, then closes. The shutter is closed
    /// whether the countdown elapsed or was cancelled.
    pub async fn pulse_with(&mut self, countdown: Countdown) -> Result<CountdownOutcome, TransportError> {
        tracing::debug!("Pulse open for {:?}", countdown.duration());
        self.open().await?;
        let outcome = countdown.run().await;
        self.close().await?;
        Ok(outcome)
    }

    /// Best-effort CLOSE followed by releasing the link. A failing close is
    /// logged; the link is released regardless.
    pub async fn release(&mut self) -> Result<(), TransportError> {
        if self.link.is_open() {
            if let Err(e) = self.close().await {
                tracing::warn!("Could not close shutter before release: {}", e);
            }
        }
        self.link.close().await
    }

    pub fn state(&self) -> ShutterState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::FirmataLink;
    use std::time::Duration;
    use tokio::time::Instant;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn attach_configures_pin_then_closes() {
        let mock = Builder::new()
            .write(&[0xF4, 8, 1])
            .write(&[0x91, 0x01, 0x00])
            .build();
        let shutter = Shutter::attach(FirmataLink::new(mock, "mock"), 8, PolarityMapping::ACTIVE_LOW)
            .await
            .unwrap();
        assert_eq!(shutter.state(), ShutterState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_pulse_still_closes() {
        let (host, board) = tokio::io::duplex(64);
        let mut shutter = Shutter::attach(FirmataLink::new(host, "duplex"), 8, PolarityMapping::ACTIVE_HIGH)
            .await
            .unwrap();

        let mut countdown = Countdown::new(Duration::from_secs(30));
        let handle = countdown.cancel_handle().unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        let start = Instant::now();
        let outcome = shutter.pulse_with(countdown).await.unwrap();
        assert_eq!(outcome, CountdownOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(shutter.state(), ShutterState::Closed);
        drop(board);
    }

    #[tokio::test]
    async fn release_closes_shutter_and_link() {
        let mock = Builder::new()
            .write(&[0xF4, 8, 1])
            .write(&[0x91, 0x01, 0x00])
            .write(&[0x91, 0x00, 0x00])
            .write(&[0x91, 0x01, 0x00])
            .build();
        let mut shutter = Shutter::attach(FirmataLink::new(mock, "mock"), 8, PolarityMapping::ACTIVE_LOW)
            .await
            .unwrap();
        shutter.open().await.unwrap();
        shutter.release().await.unwrap();
        assert!(!shutter.link().is_open());
        assert!(matches!(shutter.open().await, Err(TransportError::NotConnected)));
        assert_eq!(shutter.state(), ShutterState::Closed);
    }
}
