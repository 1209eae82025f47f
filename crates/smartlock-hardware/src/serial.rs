//! Input devices reading the keyboard listener's serial streams.
//!
//! The listener (and an optional NFC bridge) appear on the host as character
//! devices. Each device wraps the stream in a `FramedRead` with the matching
//! codec from `smartlock-keypad`; baud rate and line discipline are
//! configured outside the daemon.

use crate::error::{HardwareError, Result};
use crate::traits::{CardData, KeypadDevice, RfidDevice, ScannerDevice};
use crate::types::DeviceInfo;
use futures::StreamExt;
use smartlock_keypad::{BarcodeCodec, Key, KeyStreamCodec};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

/// Byte stream a serial device reads from.
pub type SerialStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Open a character device (or plain file / FIFO) as a serial stream.
///
/// # Errors
///
/// Returns `HardwareError::OpenFailed` if the path cannot be opened.
pub async fn open_stream(path: impl AsRef<Path>) -> Result<SerialStream> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| HardwareError::open_failed(path.display().to_string(), e))?;
    Ok(Box::new(file))
}

/// Keypad behind the keyboard listener: one ASCII character per key press.
pub struct SerialKeypad {
    frames: FramedRead<SerialStream, KeyStreamCodec>,
    port: String,
}

impl SerialKeypad {
    /// Wrap an already-open stream.
    pub fn new(stream: SerialStream, port: impl Into<String>) -> Self {
        Self {
            frames: FramedRead::new(stream, KeyStreamCodec::new()),
            port: port.into(),
        }
    }

    /// Open the keypad stream at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(open_stream(path).await?, path.display().to_string()))
    }

    /// Bytes dropped because they were not keypad characters.
    pub fn skipped(&self) -> u64 {
        self.frames.decoder().skipped()
    }
}

impl fmt::Debug for SerialKeypad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialKeypad").field("port", &self.port).finish()
    }
}

impl KeypadDevice for SerialKeypad {
    async fn read_key(&mut self) -> Result<Key> {
        match self.frames.next().await {
            Some(key) => Ok(key?),
            None => Err(HardwareError::disconnected(self.port.clone())),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Serial Keypad", "Keyboard Listener 4x5").with_port(self.port.clone()))
    }
}

/// Barcode scanner behind the keyboard listener: one code per line.
pub struct SerialScanner {
    frames: FramedRead<SerialStream, BarcodeCodec>,
    port: String,
}

impl SerialScanner {
    pub fn new(stream: SerialStream, port: impl Into<String>) -> Self {
        Self {
            frames: FramedRead::new(stream, BarcodeCodec::new()),
            port: port.into(),
        }
    }

    /// Open the scanner stream at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(open_stream(path).await?, path.display().to_string()))
    }
}

impl fmt::Debug for SerialScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialScanner").field("port", &self.port).finish()
    }
}

impl ScannerDevice for SerialScanner {
    async fn read_barcode(&mut self) -> Result<String> {
        match self.frames.next().await {
            Some(line) => Ok(line?),
            None => Err(HardwareError::disconnected(self.port.clone())),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Serial Scanner", "Keyboard Listener PS/2").with_port(self.port.clone()))
    }
}

/// NFC reader bridge printing one hex UID per line.
pub struct SerialRfid {
    frames: FramedRead<SerialStream, BarcodeCodec>,
    port: String,
}

impl SerialRfid {
    pub fn new(stream: SerialStream, port: impl Into<String>) -> Self {
        Self {
            frames: FramedRead::new(stream, BarcodeCodec::new()),
            port: port.into(),
        }
    }

    /// Open the reader bridge stream at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(open_stream(path).await?, path.display().to_string()))
    }
}

impl fmt::Debug for SerialRfid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialRfid").field("port", &self.port).finish()
    }
}

impl RfidDevice for SerialRfid {
    async fn read_card(&mut self) -> Result<CardData> {
        match self.frames.next().await {
            Some(line) => CardData::from_hex_line(&line?),
            None => Err(HardwareError::disconnected(self.port.clone())),
        }
    }

    async fn is_card_present(&self) -> Result<bool> {
        Err(HardwareError::unsupported("is_card_present on a line bridge"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Serial NFC Bridge", "PN532 UID Bridge").with_port(self.port.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartlock_core::CardUid;
    use tokio::io::AsyncWriteExt;

    fn duplex() -> (tokio::io::DuplexStream, SerialStream) {
        let (tx, rx) = tokio::io::duplex(256);
        (tx, Box::new(rx))
    }

    #[tokio::test]
    async fn test_serial_keypad_reads_keys() {
        let (mut tx, rx) = duplex();
        let mut keypad = SerialKeypad::new(rx, "test");

        tx.write_all(b"4Z2O").await.unwrap();

        assert_eq!(keypad.read_key().await.unwrap(), Key::Digit(4));
        assert_eq!(keypad.read_key().await.unwrap(), Key::Digit(2));
        assert_eq!(keypad.read_key().await.unwrap(), Key::Enter);
        assert_eq!(keypad.skipped(), 1);

        drop(tx);
        assert!(matches!(
            keypad.read_key().await,
            Err(HardwareError::Disconnected { .. })
        ));
    }

    #[tokio::test]
    async fn test_serial_scanner_reads_lines() {
        let (mut tx, rx) = duplex();
        let mut scanner = SerialScanner::new(rx, "test");

        tx.write_all(b"AC:3D:FF:A0\r\n").await.unwrap();
        assert_eq!(scanner.read_barcode().await.unwrap(), "AC:3D:FF:A0");
    }

    #[tokio::test]
    async fn test_serial_rfid_reads_uids() {
        let (mut tx, rx) = duplex();
        let mut reader = SerialRfid::new(rx, "test");

        tx.write_all(b"04ABCDEF\nnot-a-uid\n01:02:03:04\n").await.unwrap();

        assert_eq!(
            reader.read_card().await.unwrap().uid,
            CardUid::new([0x04, 0xAB, 0xCD, 0xEF])
        );
        let err = reader.read_card().await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(
            reader.read_card().await.unwrap().uid,
            CardUid::new([1, 2, 3, 4])
        );
    }

    #[tokio::test]
    async fn test_open_missing_path() {
        let result = SerialKeypad::open("/nonexistent/smartlock-keypad").await;
        assert!(matches!(
            result,
            Err(HardwareError::OpenFailed { .. })
        ));
    }
}
