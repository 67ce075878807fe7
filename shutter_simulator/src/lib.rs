//! In-process emulated shutter board.
//!
//! [`SimulatedBoard::spawn`] runs the device-side [`Bridge`] on a tokio task
//! behind an in-memory duplex stream. The host end of the stream speaks the
//! same pin protocol as a real serial port, so the host session can be
//! exercised end to end without hardware. Every level the emulated pin
//! takes is recorded with its timestamp and exposed through a [`BoardProbe`].

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::digital::{ErrorType, OutputPin};
use shutter_mcu::Bridge;
use shutter_shared::{Level, PolarityMapping, ShutterState};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::watch;
use tokio::time::Instant;

const STREAM_BUFFER: usize = 256;

/// A level change observed on the emulated pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub at: Instant,
    pub level: Level,
}

type PinLog = Arc<Mutex<Vec<PinEvent>>>;

fn lock(log: &PinLog) -> MutexGuard<'_, Vec<PinEvent>> {
    // A panicked writer cannot leave a half-pushed event behind.
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Emulated output pin writing into a shared log.
#[derive(Debug, Clone)]
pub struct RecordingPin {
    log: PinLog,
}

impl RecordingPin {
    fn record(&mut self, level: Level) {
        lock(&self.log).push(PinEvent { at: Instant::now(), level });
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(Level::High);
        Ok(())
    }
}

/// Read-only view of a running simulated board.
#[derive(Debug, Clone)]
pub struct BoardProbe {
    log: PinLog,
    polarity: PolarityMapping,
    released: watch::Receiver<bool>,
}

impl BoardProbe {
    pub fn level(&self) -> Option<Level> {
        lock(&self.log).last().map(|event| event.level)
    }

    pub fn state(&self) -> Option<ShutterState> {
        self.level().map(|level| self.polarity.state_for(level))
    }

    pub fn history(&self) -> Vec<PinEvent> {
        lock(&self.log).clone()
    }

    /// True once the host end of the link has been closed or dropped.
    pub fn is_released(&self) -> bool {
        *self.released.borrow()
    }

    pub async fn wait_released(&self) {
        let mut released = self.released.clone();
        // The board task always publishes `true` before dropping the sender.
        let _ = released.wait_for(|released| *released).await;
    }
}

pub struct SimulatedBoard;

impl SimulatedBoard {
    /// Starts a board driving `pin_number` and returns the host end of its
    /// link. Must be called from within a tokio runtime.
    pub fn spawn(pin_number: u8, polarity: PolarityMapping) -> (DuplexStream, BoardProbe) {
        let (host_end, board_end) = tokio::io::duplex(STREAM_BUFFER);
        let log: PinLog = Arc::default();
        let (released_tx, released_rx) = watch::channel(false);

        let pin = RecordingPin { log: log.clone() };
        let Ok(bridge) = Bridge::new(pin, pin_number, polarity);
        tracing::info!("Simulated board ready, shutter on pin {} (CLOSED)", pin_number);

        tokio::spawn(async move {
            serve(bridge, board_end).await;
            let _ = released_tx.send(true);
        });

        let probe = BoardProbe {
            log,
            polarity,
            released: released_rx,
        };
        (host_end, probe)
    }
}

async fn serve(mut bridge: Bridge<RecordingPin>, mut stream: DuplexStream) {
    let mut buf = [0u8; STREAM_BUFFER];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                tracing::info!("Simulated board: host disconnected");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Simulated board read error: {}", e);
                return;
            }
        };

        for &byte in &buf[..n] {
            let before = bridge.state();
            let Ok(reply) = bridge.feed(byte);
            if bridge.state() != before {
                tracing::info!(
                    "Simulated pin {} -> {} ({})",
                    bridge.pin_number(),
                    bridge.controller().level(),
                    bridge.state()
                );
            }
            if let Some(frame) = reply {
                if let Err(e) = stream.write_all(frame.as_bytes()).await {
                    tracing::warn!("Simulated board write error: {}", e);
                    return;
                }
            }
        }
    }
}
