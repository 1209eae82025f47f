//! Tokio codecs for the listener's serial streams.
//!
//! The listener forwards keypad presses as single ASCII characters and
//! scanner reads as text lines terminated by CR and/or LF. Both codecs are
//! lenient: bytes that cannot be decoded are dropped and counted instead of
//! failing the stream, since a `FramedRead` stops yielding items after the
//! first decoder error and a noisy serial line must not take the keypad down.
//!
//! # Usage with FramedRead
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use smartlock_keypad::KeyStreamCodec;
//! use tokio_util::codec::FramedRead;
//!
//! # async fn example() -> std::io::Result<()> {
//! let port = tokio::fs::File::open("/dev/ttyUSB0").await?;
//! let mut keys = FramedRead::new(port, KeyStreamCodec::new());
//!
//! while let Some(Ok(key)) = keys.next().await {
//!     println!("pressed {key}");
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Buf, BufMut, BytesMut};
use smartlock_core::constants::MAX_BARCODE_LEN;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{KeypadError, KeypadResult};
use crate::layout::Key;

/// Decodes the keypad stream into [`Key`] presses, one per byte.
///
/// Line terminators and NUL bytes are ignored; other unknown bytes are
/// counted in [`skipped`](Self::skipped).
#[derive(Debug, Default)]
pub struct KeyStreamCodec {
    skipped: u64,
}

impl KeyStreamCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes dropped because they were not keypad characters.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Decoder for KeyStreamCodec {
    type Item = Key;
    type Error = KeypadError;

    fn decode(&mut self, src: &mut BytesMut) -> KeypadResult<Option<Key>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if matches!(byte, b'\r' | b'\n' | 0) {
                continue;
            }
            match Key::try_from(byte) {
                Ok(key) => return Ok(Some(key)),
                Err(_) => self.skipped += 1,
            }
        }
        Ok(None)
    }
}

impl Encoder<Key> for KeyStreamCodec {
    type Error = KeypadError;

    fn encode(&mut self, key: Key, dst: &mut BytesMut) -> KeypadResult<()> {
        let mut buf = [0u8; 4];
        dst.extend_from_slice(key.as_char().encode_utf8(&mut buf).as_bytes());
        Ok(())
    }
}

/// Decodes the scanner stream into barcode lines.
///
/// A line ends at CR or LF; surrounding whitespace is trimmed and empty lines
/// are skipped, so `\r\n` endings produce a single line. Lines longer than
/// the configured maximum, or containing non-ASCII bytes, are discarded and
/// counted in [`discarded`](Self::discarded).
#[derive(Debug)]
pub struct BarcodeCodec {
    max_length: usize,
    /// Index to resume the terminator search from.
    next_index: usize,
    /// Set while skipping the rest of an overlong line.
    discarding: bool,
    discarded: u64,
}

impl BarcodeCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self::with_max_length(MAX_BARCODE_LEN)
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
            discarded: 0,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Number of lines dropped for being overlong or not ASCII.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn finish_line(&mut self, raw: &[u8]) -> Option<String> {
        let text = raw.trim_ascii();
        if text.is_empty() {
            return None;
        }
        if text.len() > self.max_length || !text.is_ascii() {
            self.discarded += 1;
            return None;
        }
        Some(String::from_utf8_lossy(text).into_owned())
    }
}

impl Default for BarcodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BarcodeCodec {
    type Item = String;
    type Error = KeypadError;

    fn decode(&mut self, src: &mut BytesMut) -> KeypadResult<Option<String>> {
        loop {
            let terminator = src[self.next_index..]
                .iter()
                .position(|&b| b == b'\r' || b == b'\n');

            match terminator {
                Some(offset) => {
                    let line = src.split_to(self.next_index + offset + 1);
                    self.next_index = 0;

                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    if let Some(barcode) = self.finish_line(&line) {
                        return Ok(Some(barcode));
                    }
                }
                None if src.len() > self.max_length => {
                    if !self.discarding {
                        self.discarding = true;
                        self.discarded += 1;
                    }
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                None => {
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> KeypadResult<Option<String>> {
        if let Some(barcode) = self.decode(src)? {
            return Ok(Some(barcode));
        }
        let rest = src.split();
        self.next_index = 0;
        if std::mem::take(&mut self.discarding) {
            return Ok(None);
        }
        Ok(self.finish_line(&rest))
    }
}

impl Encoder<String> for BarcodeCodec {
    type Error = KeypadError;

    fn encode(&mut self, barcode: String, dst: &mut BytesMut) -> KeypadResult<()> {
        if barcode.len() > self.max_length {
            return Err(KeypadError::LineTooLong {
                length: barcode.len(),
                max: self.max_length,
            });
        }
        if !barcode.is_ascii() || barcode.contains(['\r', '\n']) {
            return Err(KeypadError::InvalidBarcode(barcode));
        }

        dst.reserve(barcode.len() + 2);
        dst.put_slice(barcode.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stream_decodes_each_byte() {
        let mut codec = KeyStreamCodec::new();
        let mut buffer = BytesMut::from(&b"7C&O"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Digit(7)));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Clear));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Function('&')));
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Enter));
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_key_stream_skips_noise() {
        let mut codec = KeyStreamCodec::new();
        let mut buffer = BytesMut::from(&b"\r\nZ\x001"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Key::Digit(1)));
        assert_eq!(codec.skipped(), 1);
    }

    #[test]
    fn test_key_stream_encode() {
        let mut codec = KeyStreamCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode(Key::Digit(4), &mut buffer).unwrap();
        codec.encode(Key::Enter, &mut buffer).unwrap();
        assert_eq!(&buffer[..], b"4O");
    }

    #[test]
    fn test_barcode_crlf_yields_single_line() {
        let mut codec = BarcodeCodec::new();
        let mut buffer = BytesMut::from(&b"AC:3D:FF:A0\r\n12:34:56:78\r\n"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap().as_deref(),
            Some("AC:3D:FF:A0")
        );
        assert_eq!(
            codec.decode(&mut buffer).unwrap().as_deref(),
            Some("12:34:56:78")
        );
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_barcode_partial_line() {
        let mut codec = BarcodeCodec::new();
        let mut buffer = BytesMut::from(&b"AC:3D"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b":FF:A0\r");
        assert_eq!(
            codec.decode(&mut buffer).unwrap().as_deref(),
            Some("AC:3D:FF:A0")
        );
    }

    #[test]
    fn test_barcode_overlong_line_is_discarded() {
        let mut codec = BarcodeCodec::with_max_length(8);
        let mut buffer = BytesMut::from(&b"0123456789ABCDEF"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"GH\r\nshort\r\n");
        assert_eq!(codec.decode(&mut buffer).unwrap().as_deref(), Some("short"));
        assert_eq!(codec.discarded(), 1);
    }

    #[test]
    fn test_barcode_terminated_overlong_line_is_discarded() {
        let mut codec = BarcodeCodec::with_max_length(4);
        let mut buffer = BytesMut::from(&b"12345\nabcd\n"[..]);
        assert_eq!(codec.decode(&mut buffer).unwrap().as_deref(), Some("abcd"));
        assert_eq!(codec.discarded(), 1);
    }

    #[test]
    fn test_barcode_decode_eof_flushes_last_line() {
        let mut codec = BarcodeCodec::new();
        let mut buffer = BytesMut::from(&b"AC:3D:FF:A0"[..]);
        assert_eq!(
            codec.decode_eof(&mut buffer).unwrap().as_deref(),
            Some("AC:3D:FF:A0")
        );
        assert_eq!(codec.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_barcode_encode() {
        let mut codec = BarcodeCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode("AC:3D:FF:A0".to_string(), &mut buffer).unwrap();
        assert_eq!(&buffer[..], b"AC:3D:FF:A0\r\n");

        assert!(codec.encode("bad\nline".to_string(), &mut buffer).is_err());
        assert!(codec.encode("x".repeat(65), &mut buffer).is_err());
    }
}
