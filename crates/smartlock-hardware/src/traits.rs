//! Hardware device trait definitions.
//!
//! These traits are the contract between the access engine and the lock's
//! peripherals: the keypad and barcode scanner behind the keyboard listener,
//! the NFC reader and the lock relay. Each has a mock implementation driven
//! through a handle and, for the input devices, a serial-stream
//! implementation.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::{HardwareError, Result};
use crate::types::DeviceInfo;
use smartlock_core::CardUid;
use smartlock_core::constants::CARD_UID_LEN;
use smartlock_keypad::Key;

/// Keypad that reports individual key presses.
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// opaque futures; use [`AnyKeypadDevice`](crate::devices::AnyKeypadDevice)
/// for dynamic selection.
///
/// # Examples
///
/// ```no_run
/// use smartlock_hardware::traits::KeypadDevice;
/// use smartlock_hardware::Result;
/// use smartlock_keypad::Key;
///
/// async fn read_entry<K: KeypadDevice>(keypad: &mut K) -> Result<String> {
///     let mut entry = String::new();
///     loop {
///         match keypad.read_key().await? {
///             Key::Digit(d) => entry.push(char::from(b'0' + d)),
///             Key::Clear => {
///                 entry.pop();
///             }
///             Key::Enter => return Ok(entry),
///             Key::Function(_) => {}
///         }
///     }
/// }
/// ```
pub trait KeypadDevice: Send + Sync {
    /// Wait for the next key press.
    ///
    /// # Errors
    /// Returns an error if the device is disconnected.
    async fn read_key(&mut self) -> Result<Key>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Minimum UID length in bytes (per ISO 14443 specification).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (per ISO 14443 specification).
pub const MAX_UID_LENGTH: usize = 10;

/// A card read by the NFC reader.
///
/// The lock identifies cards by their first four UID bytes; longer 7- and
/// 10-byte UIDs are truncated the same way the stored card table is.
#[derive(Debug, Clone)]
pub struct CardData {
    /// Card UID used for authorization.
    pub uid: CardUid,

    /// Length of the UID the card actually reported.
    pub raw_len: usize,

    /// Timestamp when the card was read.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Build card data from the raw UID a reader reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is not within the valid range
    /// of 4-10 bytes as specified by ISO 14443.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartlock_hardware::traits::CardData;
    ///
    /// let card = CardData::from_raw(&[0x04, 0xAB, 0xCD, 0xEF, 0x12, 0x34, 0x56]).unwrap();
    /// assert_eq!(card.uid.to_hex(), "04:AB:CD:EF");
    /// assert_eq!(card.raw_len, 7);
    /// ```
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&raw.len()) {
            return Err(HardwareError::bad_card(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {}",
                raw.len()
            )));
        }
        Ok(Self {
            uid: CardUid::from_slice(&raw[..CARD_UID_LEN])?,
            raw_len: raw.len(),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Card data for a known 4-byte UID.
    pub fn new(uid: CardUid) -> Self {
        Self {
            uid,
            raw_len: CARD_UID_LEN,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Parse a UID line from a reader bridge.
    ///
    /// Accepts colon-separated (`04:AB:CD:EF`) or contiguous (`04ABCDEF`)
    /// hex.
    ///
    /// # Errors
    /// Returns `HardwareError::InvalidData` for malformed lines.
    pub fn from_hex_line(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.contains(':') {
            return Ok(Self::new(CardUid::parse_hex(line)?));
        }

        if line.len() % 2 != 0 || !line.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HardwareError::invalid_data(format!(
                "not a hex UID: {line:?}"
            )));
        }
        let raw = (0..line.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&line[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|e| HardwareError::invalid_data(e.to_string()))?;
        Self::from_raw(&raw)
    }
}

/// NFC/RFID card reader.
pub trait RfidDevice: Send + Sync {
    /// Wait for the next card presented to the reader.
    ///
    /// # Errors
    /// Returns an error if the reader is disconnected or the card could not
    /// be read.
    async fn read_card(&mut self) -> Result<CardData>;

    /// Check whether a card is currently in the field.
    async fn is_card_present(&self) -> Result<bool>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Barcode scanner delivering one scanned code per call.
pub trait ScannerDevice: Send + Sync {
    /// Wait for the next scanned barcode.
    async fn read_barcode(&mut self) -> Result<String>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// The lock relay.
///
/// A released lock lets the door open; the access engine releases it for a
/// few seconds after each granted access and engages it again afterwards.
pub trait LockActuator: Send + Sync {
    /// Energise the relay, unlocking the door.
    async fn release(&mut self) -> Result<()>;

    /// De-energise the relay, locking the door.
    async fn engage(&mut self) -> Result<()>;

    /// Whether the lock is currently released.
    fn is_released(&self) -> bool;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
