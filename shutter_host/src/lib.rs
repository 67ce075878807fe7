// shutter_host: interactive host session driving a remote shutter pin

pub mod command;
pub mod config;
pub mod error;
pub mod link;
pub mod serial;
pub mod session;
pub mod shutter;
pub mod timer;

pub use config::{Config, load_config};
pub use error::{ConfigError, InputError, SessionError, TransportError};
pub use link::{FirmataLink, PinLink};
pub use session::{Session, SessionEnd};
pub use shutter::Shutter;
