//! Scanner filter run by the keyboard listener.
//!
//! The barcode scanner presents itself as a PS/2 keyboard. The listener
//! forwards printable characters to the host serial line and turns the
//! scanner's ENTER into a line break. Navigation and editing keys are
//! dropped. Scanned codes are card UIDs (`AC:3D:FF:A0`), so once the final
//! octet after the third `:` is complete the line is terminated even if the
//! scanner never sends ENTER.

use bytes::{BufMut, BytesMut};
use smartlock_core::constants::BARCODE_UID_SEPARATORS;

/// Hex digits in the final UID octet.
const FINAL_OCTET_DIGITS: usize = 2;

/// A key event reported by the PS/2 scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKey {
    Char(char),
    Enter,
    Tab,
    Escape,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
    Delete,
}

impl ScanKey {
    /// Keys the listener never forwards.
    fn is_dropped(self) -> bool {
        matches!(
            self,
            ScanKey::Tab
                | ScanKey::Escape
                | ScanKey::PageUp
                | ScanKey::PageDown
                | ScanKey::Left
                | ScanKey::Right
                | ScanKey::Up
                | ScanKey::Down
                | ScanKey::Delete
        )
    }
}

/// Stateful filter from scanner key events to serial output.
#[derive(Debug, Default)]
pub struct ScannerFilter {
    separators: usize,
    final_digits: usize,
}

impl ScannerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one key event, appending whatever the listener would transmit.
    pub fn feed(&mut self, key: ScanKey, out: &mut BytesMut) {
        if key.is_dropped() {
            return;
        }

        let c = match key {
            ScanKey::Enter => {
                self.end_line(out);
                return;
            }
            ScanKey::Char(c) if c.is_ascii() && !c.is_ascii_control() => c,
            _ => return,
        };

        out.put_u8(c as u8);

        if self.separators == BARCODE_UID_SEPARATORS {
            self.final_digits += 1;
            if self.final_digits == FINAL_OCTET_DIGITS {
                self.end_line(out);
            }
        } else if c == ':' {
            self.separators += 1;
        }
    }

    /// Feed a whole sequence of key events.
    pub fn feed_all<I>(&mut self, keys: I, out: &mut BytesMut)
    where
        I: IntoIterator<Item = ScanKey>,
    {
        for key in keys {
            self.feed(key, out);
        }
    }

    fn end_line(&mut self, out: &mut BytesMut) {
        out.put_slice(b"\r\n");
        self.separators = 0;
        self.final_digits = 0;
    }
}
