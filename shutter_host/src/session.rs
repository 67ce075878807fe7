//! Interactive shutter session.
//!
//! One command is read, executed, and reported before the next line is
//! read; a pulse blocks the loop for its full duration. Any transport error
//! ends the session: the shutter is closed if still possible, the link is
//! released, and the error is returned to the caller.

use std::future::Future;
use std::io::Write;
use std::ops::ControlFlow;

use shutter_shared::PulseRequest;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::command::{self, Command, HELP, USAGE_HINT};
use crate::config::Config;
use crate::error::SessionError;
use crate::link::PinLink;
use crate::shutter::Shutter;

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
    Interrupted,
}

impl SessionEnd {
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionEnd::Quit | SessionEnd::EndOfInput => 0,
            SessionEnd::Interrupted => 130,
        }
    }
}

pub struct Session<L> {
    shutter: Shutter<L>,
    default_pulse: PulseRequest,
}

impl<L: PinLink> Session<L> {
    pub fn new(shutter: Shutter<L>, default_pulse: PulseRequest) -> Self {
        Self { shutter, default_pulse }
    }

    /// Brings up a freshly opened link: waits for the board to settle,
    /// optionally checks its protocol version, then claims the shutter pin.
    pub async fn start(mut link: L, config: &Config) -> Result<Self, SessionError> {
        let settle = config.serial.settle_time();
        if !settle.is_zero() {
            tracing::debug!("Waiting {:?} for board to settle", settle);
            tokio::time::sleep(settle).await;
        }

        if config.serial.probe_version {
            match link.probe_version(config.serial.response_timeout()).await {
                Ok((major, minor)) => tracing::info!("Board protocol version {}.{}", major, minor),
                Err(e) => tracing::warn!("Board did not report a protocol version: {}", e),
            }
        }

        let polarity = config.shutter.polarity()?;
        let default_pulse = config.pulse.default_request()?;
        let shutter = Shutter::attach(link, config.shutter.pin, polarity).await?;
        Ok(Self::new(shutter, default_pulse))
    }

    pub fn shutter(&self) -> &Shutter<L> {
        &self.shutter
    }

    /// Runs the command loop until `q`, end of input, `interrupt`
    /// resolving, or a transport or console failure. The shutter is closed
    /// and the link released in every case.
    pub async fn run<R, W, F>(
        &mut self,
        input: R,
        out: &mut W,
        interrupt: F,
    ) -> Result<SessionEnd, SessionError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        F: Future<Output = ()>,
    {
        let result = self.command_loop(input, out, interrupt).await;
        if let Err(e) = &result {
            tracing::error!("Session aborted: {}", e);
            if let Err(console) = writeln!(out, "Error: {}", e) {
                tracing::warn!("Could not report error on console: {}", console);
            }
        }
        let shutdown = self.shutdown(out).await;
        let end = result?;
        shutdown?;
        Ok(end)
    }

    async fn command_loop<R, W, F>(
        &mut self,
        input: R,
        out: &mut W,
        interrupt: F,
    ) -> Result<SessionEnd, SessionError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        F: Future<Output = ()>,
    {
        writeln!(out, "Connected.")?;
        writeln!(out, "{}", HELP)?;

        let mut lines = input.lines();
        tokio::pin!(interrupt);

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                () = &mut interrupt => {
                    writeln!(out)?;
                    tracing::info!("Interrupted");
                    return Ok(SessionEnd::Interrupted);
                }
            };
            let Some(line) = line else {
                writeln!(out)?;
                return Ok(SessionEnd::EndOfInput);
            };

            if let ControlFlow::Break(()) = self.execute(&line, out).await? {
                return Ok(SessionEnd::Quit);
            }
        }
    }

    async fn execute<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<ControlFlow<()>, SessionError> {
        let parsed = command::parse(line, self.default_pulse);
        if let Some(warning) = &parsed.warning {
            tracing::warn!("{}", warning);
            writeln!(out, "{}", warning)?;
        }

        match parsed.command {
            Command::Empty => {}
            Command::Open => {
                self.shutter.open().await?;
                writeln!(out, "Shutter: OPEN")?;
            }
            Command::Close => {
                self.shutter.close().await?;
                writeln!(out, "Shutter: CLOSED")?;
            }
            Command::Pulse(request) => {
                writeln!(out, "Pulsing open for {} ms...", request.as_millis())?;
                out.flush()?;
                self.shutter.pulse(request).await?;
                writeln!(out, "Shutter: CLOSED")?;
            }
            Command::Quit => {
                writeln!(out, "Quitting.")?;
                return Ok(ControlFlow::Break(()));
            }
            Command::Unknown(token) => {
                tracing::debug!("Unknown command {:?}", token);
                writeln!(out, "{}", USAGE_HINT)?;
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    async fn shutdown<W: Write>(&mut self, out: &mut W) -> Result<(), SessionError> {
        // The release must run even when the console is gone.
        let notice = writeln!(out, "Closing shutter and releasing board...");
        let released = self.shutter.release().await;
        notice?;
        if let Err(e) = released {
            tracing::warn!("Releasing board failed: {}", e);
            writeln!(out, "Release failed: {}", e)?;
        }
        writeln!(out, "Done.")?;
        Ok(())
    }
}
