//! 4x5 matrix keypad layout.
//!
//! ```text
//!        c0   c1   c2   c3   c4
//! r0  [  7    8    9    &    C  ]
//! r1  [  4    5    6    X    ^  ]
//! r2  [  1    2    3    F    v  ]
//! r3  [  0    .    Q    O    /  ]
//! ```
//!
//! The listener sends the character printed on each key. `C` clears the last
//! entered digit and `O` confirms the entry; the remaining symbol keys have
//! no role in access control and are reported as [`Key::Function`].

use crate::error::{KeypadError, KeypadResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keypad rows.
pub const KEYPAD_ROWS: usize = 4;

/// Keypad columns.
pub const KEYPAD_COLUMNS: usize = 5;

/// Character printed on each key, row-major.
pub const KEYPAD_LAYOUT: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
    ['7', '8', '9', '&', 'C'],
    ['4', '5', '6', 'X', '^'],
    ['1', '2', '3', 'F', 'v'],
    ['0', '.', 'Q', 'O', '/'],
];

/// Character sent for the clear key.
pub const CLEAR_CHAR: char = 'C';

/// Character sent for the confirm key.
pub const ENTER_CHAR: char = 'O';

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric key 0-9.
    Digit(u8),
    /// Remove the last entered digit.
    Clear,
    /// Submit the current entry.
    Enter,
    /// Any other symbol key (`&`, `X`, `^`, `F`, `v`, `.`, `Q`, `/`).
    Function(char),
}

impl Key {
    /// Classify a character received from the listener.
    ///
    /// # Errors
    /// Returns `KeypadError::UnknownKey` for characters not on the layout.
    pub fn from_char(c: char) -> KeypadResult<Self> {
        match c {
            '0'..='9' => Ok(Key::Digit(c as u8 - b'0')),
            CLEAR_CHAR => Ok(Key::Clear),
            ENTER_CHAR => Ok(Key::Enter),
            _ if KEYPAD_LAYOUT.iter().flatten().any(|&k| k == c) => Ok(Key::Function(c)),
            _ => Err(KeypadError::UnknownKey {
                code: u8::try_from(u32::from(c)).unwrap_or(u8::MAX),
            }),
        }
    }

    /// Character printed on the key.
    #[must_use]
    pub fn as_char(&self) -> char {
        match self {
            Key::Digit(d) => char::from(b'0' + d),
            Key::Clear => CLEAR_CHAR,
            Key::Enter => ENTER_CHAR,
            Key::Function(c) => *c,
        }
    }

    /// Returns `Some(digit)` for numeric keys.
    #[must_use]
    pub fn digit(&self) -> Option<u8> {
        match self {
            Key::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Key {
    type Error = KeypadError;

    fn try_from(code: u8) -> KeypadResult<Self> {
        if !code.is_ascii() {
            return Err(KeypadError::UnknownKey { code });
        }
        Key::from_char(char::from(code))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Key at a matrix position, or `None` outside the 4x5 grid.
#[must_use]
pub fn key_at(row: usize, col: usize) -> Option<Key> {
    let c = *KEYPAD_LAYOUT.get(row)?.get(col)?;
    Key::from_char(c).ok()
}
