//! Peripheral failures.
//!
//! Two kinds matter to the runtime: a bad read (garbled UID, key not on the
//! layout) that only loses that read, and a lost device whose task has to
//! stop. [`HardwareError::is_fatal`] tells them apart.

use smartlock_keypad::KeypadError;
use std::io;

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device's handle or stream went away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A device node or GPIO file could not be opened.
    #[error("Cannot open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A line or byte from the device made no sense.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// The reader saw a card it cannot use.
    #[error("Unreadable card: {reason}")]
    BadCard { reason: String },

    #[error("Relay error: {message}")]
    Relay { message: String },

    #[error("{operation} is not supported by this device")]
    Unsupported { operation: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn open_failed(path: impl Into<String>, source: io::Error) -> Self {
        Self::OpenFailed {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn bad_card(reason: impl Into<String>) -> Self {
        Self::BadCard {
            reason: reason.into(),
        }
    }

    pub fn relay(message: impl Into<String>) -> Self {
        Self::Relay {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Whether the device is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. }
                | Self::OpenFailed { .. }
                | Self::Io(_)
                | Self::Unsupported { .. }
        )
    }
}

impl From<KeypadError> for HardwareError {
    fn from(error: KeypadError) -> Self {
        match error {
            KeypadError::Io(io) => Self::Io(io),
            other => Self::invalid_data(other.to_string()),
        }
    }
}

impl From<smartlock_core::Error> for HardwareError {
    fn from(error: smartlock_core::Error) -> Self {
        Self::invalid_data(error.to_string())
    }
}
