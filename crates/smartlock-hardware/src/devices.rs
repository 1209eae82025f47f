//! Enum wrappers for hardware device dispatch.
//!
//! Native `async fn` in traits (RPITIT - Rust Edition 2024) are not
//! object-safe, so we cannot use `Box<dyn KeypadDevice>`. These enums provide
//! concrete type dispatch instead, letting the peripheral manager and the
//! daemon pick mock or serial devices at runtime.
//!
//! # Examples
//!
//! ```
//! use smartlock_hardware::devices::AnyKeypadDevice;
//! use smartlock_hardware::mock::MockKeypad;
//!
//! let (keypad, _handle) = MockKeypad::new();
//! let any_keypad = AnyKeypadDevice::Mock(keypad);
//! ```

use crate::gpio::GpioRelay;
use crate::mock::{MockKeypad, MockLockActuator, MockRfid, MockScanner};
use crate::serial::{SerialKeypad, SerialRfid, SerialScanner};
use crate::traits::{CardData, KeypadDevice, LockActuator, RfidDevice, ScannerDevice};
use crate::{DeviceInfo, Result};
use smartlock_keypad::Key;

/// Enum wrapper for keypad device dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeypadDevice {
    /// Mock keypad for development and testing.
    Mock(MockKeypad),
    /// Keypad behind the keyboard listener's serial line.
    Serial(SerialKeypad),
}

impl KeypadDevice for AnyKeypadDevice {
    async fn read_key(&mut self) -> Result<Key> {
        match self {
            Self::Mock(device) => device.read_key().await,
            Self::Serial(device) => device.read_key().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
            Self::Serial(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for NFC reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyRfidDevice {
    /// Mock reader for development and testing.
    Mock(MockRfid),
    /// Reader bridge printing UIDs on a serial line.
    Serial(SerialRfid),
}

impl RfidDevice for AnyRfidDevice {
    async fn read_card(&mut self) -> Result<CardData> {
        match self {
            Self::Mock(device) => device.read_card().await,
            Self::Serial(device) => device.read_card().await,
        }
    }

    async fn is_card_present(&self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.is_card_present().await,
            Self::Serial(device) => device.is_card_present().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
            Self::Serial(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for barcode scanner dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyScannerDevice {
    /// Mock scanner for development and testing.
    Mock(MockScanner),
    /// Scanner behind the keyboard listener's serial line.
    Serial(SerialScanner),
}

impl ScannerDevice for AnyScannerDevice {
    async fn read_barcode(&mut self) -> Result<String> {
        match self {
            Self::Mock(device) => device.read_barcode().await,
            Self::Serial(device) => device.read_barcode().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
            Self::Serial(device) => device.get_info().await,
        }
    }
}

/// Enum wrapper for lock relay dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyLockActuator {
    /// Mock relay for development and testing.
    Mock(MockLockActuator),
    /// Relay on a GPIO line.
    Gpio(GpioRelay),
}

impl LockActuator for AnyLockActuator {
    async fn release(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.release().await,
            Self::Gpio(device) => device.release().await,
        }
    }

    async fn engage(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.engage().await,
            Self::Gpio(device) => device.engage().await,
        }
    }

    fn is_released(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_released(),
            Self::Gpio(device) => device.is_released(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
            Self::Gpio(device) => device.get_info().await,
        }
    }
}
