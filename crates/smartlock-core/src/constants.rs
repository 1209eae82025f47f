//! Persistent memory layout and behavioural constants for the lock.
//!
//! The lock keeps all of its state in a 512-byte EEPROM image. Settings live
//! at fixed offsets at the start of the image and the user card table is a
//! packed array of 4-byte UIDs that fills the remainder.
//!
//! # Memory Layout
//!
//! | Offset | Size | Field             |
//! |--------|------|-------------------|
//! | 0      | 1    | first run flag    |
//! | 1      | 8    | admin password    |
//! | 9      | 1    | NFC enabled       |
//! | 10     | 1    | PIN enabled       |
//! | 11     | 1    | scanner enabled   |
//! | 12     | 8    | PIN code          |
//! | 20     | 4    | master card UID   |
//! | 24     | 1    | lock time (min)   |
//! | 25     | 1    | user card count   |
//! | 26     | 4*n  | user card UIDs    |
//!
//! Text fields are NUL-padded to their full width.
//!
//! # Usage
//!
//! ```
//! use smartlock_core::constants::*;
//!
//! assert_eq!(USER_CARDS_OFFSET + MAX_USER_CARDS * CARD_UID_LEN, 506);
//! assert!(USER_CARDS_OFFSET + MAX_USER_CARDS * CARD_UID_LEN <= EEPROM_SIZE);
//! ```

// ============================================================================
// Memory Layout
// ============================================================================

/// Total size of the persistent memory image in bytes.
pub const EEPROM_SIZE: usize = 512;

/// Offset of the first-run flag (1 = setup wizard pending).
pub const FIRST_RUN_OFFSET: usize = 0;

/// Offset of the NUL-padded admin password.
pub const ADMIN_PASSWORD_OFFSET: usize = 1;

/// Offset of the NFC reader enable flag.
pub const NFC_ENABLED_OFFSET: usize = 9;

/// Offset of the keypad PIN enable flag.
pub const PIN_ENABLED_OFFSET: usize = 10;

/// Offset of the barcode scanner enable flag.
pub const SCANNER_ENABLED_OFFSET: usize = 11;

/// Offset of the NUL-padded PIN code.
pub const PIN_CODE_OFFSET: usize = 12;

/// Offset of the master card UID.
pub const MASTER_CARD_OFFSET: usize = 20;

/// Offset of the lockout duration in minutes.
pub const LOCK_TIME_OFFSET: usize = 24;

/// Offset of the number of enrolled user cards.
pub const USER_CARD_COUNT_OFFSET: usize = 25;

/// Offset of the first enrolled user card.
pub const USER_CARDS_OFFSET: usize = 26;

// ============================================================================
// Field Sizes
// ============================================================================

/// Card UID length in bytes.
pub const CARD_UID_LEN: usize = 4;

/// Maximum admin password length (field width).
pub const ADMIN_PASSWORD_LEN: usize = 8;

/// Maximum PIN code length (field width).
pub const PIN_CODE_LEN: usize = 8;

/// Maximum number of enrolled user cards.
///
/// The image has room for 121 UIDs after the settings block; the table is
/// capped one below that.
pub const MAX_USER_CARDS: usize = 120;

// ============================================================================
// Factory Defaults
// ============================================================================

/// Admin password written by a factory reset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Lockout duration (minutes) written by a factory reset.
pub const DEFAULT_LOCK_TIME_MINUTES: u8 = 5;

// ============================================================================
// Access Policy
// ============================================================================

/// Failed attempts that trigger a lockout.
pub const MAX_FAILED_ATTEMPTS: u8 = 3;

/// How long the lock stays released after a granted access (milliseconds).
pub const UNLOCK_DURATION_MS: u64 = 3_000;

/// How long a grant/deny message is shown before returning to the prompt
/// (milliseconds).
pub const MESSAGE_DURATION_MS: u64 = 3_000;

/// NFC reader poll interval (milliseconds).
pub const NFC_POLL_INTERVAL_MS: u64 = 500;

// ============================================================================
// Display
// ============================================================================

/// Character LCD columns.
pub const DISPLAY_COLUMNS: usize = 16;

/// Character LCD rows.
pub const DISPLAY_ROWS: usize = 2;

// ============================================================================
// Input Streams
// ============================================================================

/// Maximum barcode line length accepted from the scanner stream.
pub const MAX_BARCODE_LEN: usize = 64;

/// Colons that terminate a scanned UID (`AC:3D:FF:A0` has three).
pub const BARCODE_UID_SEPARATORS: usize = 3;
