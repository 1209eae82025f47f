use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Credential errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid PIN code: {0}")]
    InvalidPin(String),

    #[error("Invalid admin password: {0}")]
    InvalidPassword(String),

    #[error("Invalid lock time: {0}")]
    InvalidLockTime(String),

    // Input errors
    #[error("Invalid key code: 0x{code:02X}")]
    InvalidKey { code: u8 },

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}

pub type Result<T> = std::result::Result<T, Error>;
