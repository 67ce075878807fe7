//! Interactive command parsing.
//!
//! Lines are trimmed and split on whitespace; the first token selects the
//! command (case-insensitive) and extra tokens are ignored except for the
//! pulse duration.

use shutter_shared::PulseRequest;

use crate::error::InputError;

pub const USAGE_HINT: &str = "Unknown command. Use: o, c, p <ms>, q";

pub const HELP: &str = "\
Commands:
  o           -> open shutter
  c           -> close shutter
  p <ms>      -> pulse open for <ms> milliseconds (e.g. 'p 500')
  q           -> quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Pulse(PulseRequest),
    Quit,
    /// Blank line.
    Empty,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub command: Command,
    /// Set when part of the input was replaced by a default.
    pub warning: Option<InputError>,
}

impl From<Command> for Parsed {
    fn from(command: Command) -> Self {
        Self { command, warning: None }
    }
}

pub fn parse(line: &str, default_pulse: PulseRequest) -> Parsed {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Command::Empty.into();
    };

    match head.to_ascii_lowercase().as_str() {
        "o" => Command::Open.into(),
        "c" => Command::Close.into(),
        "q" => Command::Quit.into(),
        "p" => match tokens.next() {
            None => Command::Pulse(default_pulse).into(),
            Some(arg) => match arg.parse::<u64>().ok().and_then(PulseRequest::from_millis) {
                Some(request) => Command::Pulse(request).into(),
                None => Parsed {
                    command: Command::Pulse(default_pulse),
                    warning: Some(InputError::InvalidDuration {
                        given: arg.to_string(),
                        default_ms: default_pulse.as_millis(),
                    }),
                },
            },
        },
        _ => Command::Unknown(head.to_string()).into(),
    }
}
