//! Keypad and barcode scanner input for the smart lock.
//!
//! A small listener microcontroller scans the 4x5 matrix keypad and a PS/2
//! barcode scanner and forwards what it reads over serial lines. This crate
//! holds both ends of that link:
//!
//! - [`layout`]: the keypad matrix and the [`Key`] classification the access
//!   engine works with
//! - [`codec`]: `tokio_util` codecs decoding the keypad byte stream into
//!   [`Key`]s and the scanner stream into barcode lines
//! - [`listener`]: the listener's scanner filter, which turns raw scanner key
//!   events into the line-oriented stream the host reads
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use smartlock_keypad::{Key, KeyStreamCodec};
//! use tokio_util::codec::Decoder;
//!
//! let mut codec = KeyStreamCodec::new();
//! let mut buffer = BytesMut::from(&b"12O"[..]);
//!
//! assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Digit(1)));
//! assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Digit(2)));
//! assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Enter));
//! ```

pub mod codec;
pub mod error;
pub mod layout;
pub mod listener;

pub use codec::{BarcodeCodec, KeyStreamCodec};
pub use error::{KeypadError, KeypadResult};
pub use layout::{KEYPAD_COLUMNS, KEYPAD_LAYOUT, KEYPAD_ROWS, Key, key_at};
pub use listener::{ScanKey, ScannerFilter};
