use thiserror::Error;

/// Errors raised while decoding keypad and scanner streams.
#[derive(Error, Debug)]
pub enum KeypadError {
    /// Byte that does not correspond to any key on the keypad.
    #[error("Unknown key code: 0x{code:02X}")]
    UnknownKey { code: u8 },

    /// Scanner line exceeded the maximum accepted length.
    #[error("Barcode too long: {length} bytes exceeds maximum of {max}")]
    LineTooLong { length: usize, max: usize },

    /// Scanner line contained a line terminator or non-ASCII byte.
    #[error("Invalid barcode: {0}")]
    InvalidBarcode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type KeypadResult<T> = std::result::Result<T, KeypadError>;
