//! Cancellable countdown for pulse waits.
//!
//! The session runs every countdown to completion, but each one hands out a
//! [`CancelHandle`] so a pulse can be cut short by another task.

use std::time::Duration;

use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Elapsed,
    Cancelled,
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Returns false if the countdown already finished.
    pub fn cancel(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[derive(Debug)]
pub struct Countdown {
    duration: Duration,
    cancel_tx: Option<oneshot::Sender<()>>,
    cancel_rx: oneshot::Receiver<()>,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        Self {
            duration,
            cancel_tx: Some(cancel_tx),
            cancel_rx,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Only one handle exists per countdown.
    pub fn cancel_handle(&mut self) -> Option<CancelHandle> {
        self.cancel_tx.take().map(|tx| CancelHandle { tx })
    }

    pub async fn run(self) -> CountdownOutcome {
        let Countdown {
            duration,
            cancel_tx: _unclaimed,
            cancel_rx,
        } = self;

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        // A dropped handle closes the channel with an error; that branch is
        // then disabled and the sleep decides.
        tokio::select! {
            () = &mut sleep => CountdownOutcome::Elapsed,
            Ok(()) = cancel_rx => CountdownOutcome::Cancelled,
        }
    }
}
