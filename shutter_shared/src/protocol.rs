//! Pin wire protocol (Firmata subset).
//!
//! Only the messages needed to claim one pin as a digital output and drive
//! it are modeled:
//!
//! ```text
//! SET_PIN_MODE           0xF4 pin mode
//! DIGITAL_MESSAGE        0x90|port lsb7 msb1
//! SET_DIGITAL_PIN_VALUE  0xF5 pin value
//! REPORT_VERSION         0xF9              (host query)
//! REPORT_VERSION         0xF9 major minor  (device reply)
//! SYSTEM_RESET           0xFF
//! ```
//!
//! Command bytes have the high bit set, data bytes never do. A command byte
//! arriving mid-message discards the partial message, which keeps the
//! decoder in sync after line noise or a host reconnect.

use crate::polarity::Level;

pub const DIGITAL_MESSAGE: u8 = 0x90;
pub const ANALOG_MESSAGE: u8 = 0xE0;
pub const REPORT_ANALOG: u8 = 0xC0;
pub const REPORT_DIGITAL: u8 = 0xD0;
pub const START_SYSEX: u8 = 0xF0;
pub const SET_PIN_MODE: u8 = 0xF4;
pub const SET_DIGITAL_PIN_VALUE: u8 = 0xF5;
pub const END_SYSEX: u8 = 0xF7;
pub const REPORT_VERSION: u8 = 0xF9;
pub const SYSTEM_RESET: u8 = 0xFF;

/// Protocol version reported by the device side.
pub const PROTOCOL_VERSION: (u8, u8) = (2, 5);

/// Highest pin number addressable by a two-byte pin message.
pub const MAX_PIN: u8 = 127;

pub const PIN_MODE_INPUT: u8 = 0x00;
pub const PIN_MODE_OUTPUT: u8 = 0x01;

/// Port index holding `pin` (eight pins per port).
pub fn port_of(pin: u8) -> u8 {
    pin / 8
}

/// Bit of `pin` inside its port value.
pub fn port_bit(pin: u8) -> u8 {
    1 << (pin % 8)
}

/// Messages travelling from host to device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    SetPinMode { pin: u8, mode: u8 },
    DigitalPort { port: u8, value: u8 },
    SetDigitalPinValue { pin: u8, level: Level },
    VersionQuery,
    SystemReset,
}

impl Message {
    pub fn encode(&self) -> Frame {
        match *self {
            Message::SetPinMode { pin, mode } => Frame::new(&[SET_PIN_MODE, pin & 0x7F, mode & 0x7F]),
            Message::DigitalPort { port, value } => Frame::new(&[
                DIGITAL_MESSAGE | (port & 0x0F),
                value & 0x7F,
                (value >> 7) & 0x01,
            ]),
            Message::SetDigitalPinValue { pin, level } => {
                Frame::new(&[SET_DIGITAL_PIN_VALUE, pin & 0x7F, level.is_high() as u8])
            }
            Message::VersionQuery => Frame::new(&[REPORT_VERSION]),
            Message::SystemReset => Frame::new(&[SYSTEM_RESET]),
        }
    }
}

/// Device reply to a version query.
pub fn version_reply(major: u8, minor: u8) -> Frame {
    Frame::new(&[REPORT_VERSION, major & 0x7F, minor & 0x7F])
}

/// An encoded message; at most three bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; 3],
    len: usize,
}

impl Frame {
    fn new(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 3];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self { bytes: buf, len: bytes.len() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Idle,
    /// Collecting the data bytes of `command`.
    Collecting { command: u8, data: [u8; 2], have: usize, need: usize },
    /// Inside a sysex block; everything up to END_SYSEX is skipped.
    Sysex,
}

/// Streaming decoder for host-to-device messages.
///
/// Bytes may arrive one at a time or split at any boundary.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    state: DecodeState,
}

impl CommandDecoder {
    pub fn new() -> Self {
        Self { state: DecodeState::Idle }
    }

    pub fn reset(&mut self) {
        self.state = DecodeState::Idle;
    }

    /// Feeds one byte; returns a message once the last byte of it arrives.
    pub fn push(&mut self, byte: u8) -> Option<Message> {
        if byte & 0x80 != 0 {
            return self.command_byte(byte);
        }

        match &mut self.state {
            DecodeState::Collecting { command, data, have, need } => {
                data[*have] = byte;
                *have += 1;
                if *have < *need {
                    return None;
                }
                let (command, data) = (*command, *data);
                self.state = DecodeState::Idle;
                Self::complete(command, data)
            }
            // Stray data bytes and sysex payloads are dropped.
            DecodeState::Idle | DecodeState::Sysex => None,
        }
    }

    fn command_byte(&mut self, byte: u8) -> Option<Message> {
        if byte == END_SYSEX {
            self.state = DecodeState::Idle;
            return None;
        }

        let need = match byte {
            START_SYSEX => {
                self.state = DecodeState::Sysex;
                return None;
            }
            REPORT_VERSION => {
                self.state = DecodeState::Idle;
                return Some(Message::VersionQuery);
            }
            SYSTEM_RESET => {
                self.state = DecodeState::Idle;
                return Some(Message::SystemReset);
            }
            SET_PIN_MODE | SET_DIGITAL_PIN_VALUE => 2,
            b if b & 0xF0 == DIGITAL_MESSAGE || b & 0xF0 == ANALOG_MESSAGE => 2,
            b if b & 0xF0 == REPORT_ANALOG || b & 0xF0 == REPORT_DIGITAL => 1,
            _ => {
                self.state = DecodeState::Idle;
                return None;
            }
        };

        self.state = DecodeState::Collecting { command: byte, data: [0; 2], have: 0, need };
        None
    }

    fn complete(command: u8, data: [u8; 2]) -> Option<Message> {
        match command {
            SET_PIN_MODE => Some(Message::SetPinMode { pin: data[0], mode: data[1] }),
            SET_DIGITAL_PIN_VALUE => Some(Message::SetDigitalPinValue {
                pin: data[0],
                level: Level::from(data[1] != 0),
            }),
            c if c & 0xF0 == DIGITAL_MESSAGE => Some(Message::DigitalPort {
                port: c & 0x0F,
                value: (data[0] & 0x7F) | ((data[1] & 0x01) << 7),
            }),
            // Analog and reporting messages are parsed only to stay in sync.
            _ => None,
        }
    }
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new()
    }
}
