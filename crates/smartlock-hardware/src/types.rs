//! Common types shared across hardware device implementations.

use serde::{Deserialize, Serialize};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "PN532", "Mock Keypad").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Serial port or stream path the device is attached to.
    pub port: Option<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            port: None,
            firmware_version: None,
        }
    }

    /// Set the port path.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Type of input peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Matrix keypad behind the keyboard listener.
    Keypad,

    /// NFC/RFID card reader.
    Rfid,

    /// Barcode scanner behind the keyboard listener.
    Scanner,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keypad => write!(f, "Keypad"),
            Self::Rfid => write!(f, "RFID"),
            Self::Scanner => write!(f, "Scanner"),
        }
    }
}
