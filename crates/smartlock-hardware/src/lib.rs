//! Hardware abstraction layer for the smart lock.
//!
//! The lock has three input peripherals and one output:
//!
//! - a 4x5 matrix keypad, read through the keyboard listener,
//! - an NFC card reader,
//! - a barcode scanner, also read through the keyboard listener,
//! - the door relay.
//!
//! Each is described by a trait in [`traits`]. Inputs come in two flavours:
//! mocks driven through a handle (tests and the daemon's `mock` device mode)
//! and serial-stream drivers that decode the listener's line protocol. The
//! relay is either mocked or driven through a sysfs GPIO value file.
//!
//! # Design Philosophy
//!
//! - **Async-first**: device I/O uses native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: the traits are not object-safe, so the `Any*` enums in
//!   [`devices`] pick an implementation at runtime.
//! - **Thread-safe**: all traits require `Send + Sync` for use with Tokio.
//!
//! # Reading events
//!
//! [`PeripheralManager`] runs every input device in its own task and merges
//! their reads into one stream of [`PeripheralEvent`]s:
//!
//! ```no_run
//! use smartlock_hardware::{PeripheralConfig, PeripheralEvent, PeripheralManager};
//! use smartlock_hardware::devices::AnyRfidDevice;
//! use smartlock_hardware::mock::MockRfid;
//!
//! # async fn run() -> smartlock_hardware::Result<()> {
//! let mut manager = PeripheralManager::new(PeripheralConfig::default());
//! let (rfid, _reader) = MockRfid::new();
//! manager.register_rfid(AnyRfidDevice::Mock(rfid));
//!
//! let mut events = manager.start();
//! if let Some(PeripheralEvent::CardRead(card)) = events.recv().await {
//!     println!("card {}", card.uid);
//! }
//! events.shutdown().await
//! # }
//! ```

pub mod devices;
pub mod error;
pub mod gpio;
pub mod manager;
pub mod mock;
pub mod serial;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::{AnyKeypadDevice, AnyLockActuator, AnyRfidDevice, AnyScannerDevice};
pub use error::{HardwareError, Result};
pub use gpio::GpioRelay;
pub use serial::{SerialKeypad, SerialRfid, SerialScanner};
pub use traits::{
    CardData, KeypadDevice, LockActuator, MAX_UID_LENGTH, MIN_UID_LENGTH, RfidDevice,
    ScannerDevice,
};
pub use types::{DeviceInfo, DeviceType};

pub use manager::{
    PeripheralConfig, PeripheralEvent, PeripheralHandle, PeripheralManager, PeripheralStats,
};
