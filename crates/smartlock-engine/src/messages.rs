//! Text shown on the lock's 16x2 LCD.
//!
//! ```
//! use smartlock_engine::messages::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::PROMPT, "ENTER PASS:");
//! ```

/// Display messages, ASCII only and at most 16 characters each.
pub struct DisplayMessages;

impl DisplayMessages {
    /// Idle prompt; entered PIN digits appear masked on the second line.
    pub const PROMPT: &'static str = "ENTER PASS:";

    pub const ACCESS_GRANTED: &'static str = "ACCESS GRANTED";

    pub const ACCESS_DENIED: &'static str = "ACCESS DENIED";

    /// Shown for the whole lockout period.
    pub const LOCKED: &'static str = "LOCKED";

    /// First-run wizard, step one.
    pub const SCAN_MASTER: &'static str = "Scan master card";

    /// First-run wizard; the master UID follows on the second line.
    pub const MASTER_ID: &'static str = "Master ID:";

    /// First-run wizard, step two; digits are shown in clear.
    pub const ENTER_PIN: &'static str = "Enter PIN:";

    pub const PIN_SAVED: &'static str = "Password saved";

    /// Master mode, first line.
    pub const MASTER_MODE: &'static str = "Scan card to";

    /// Master mode, second line.
    pub const MASTER_MODE_HINT: &'static str = "add or delete";

    pub const EXITING: &'static str = "EXITING....";

    pub const CARD_ADDED: &'static str = "Card added";

    pub const CARD_DELETED: &'static str = "Card deleted";

    pub const MEMORY_FULL: &'static str = "MEMORY FULL";

    /// Shown when the memory image could not be updated.
    pub const STORAGE_ERROR: &'static str = "MEMORY ERROR";

    /// Character used to mask PIN digits.
    pub const PIN_MASK: char = 'X';
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartlock_core::constants::DISPLAY_COLUMNS;

    #[test]
    fn test_messages_fit_display() {
        let messages = [
            DisplayMessages::PROMPT,
            DisplayMessages::ACCESS_GRANTED,
            DisplayMessages::ACCESS_DENIED,
            DisplayMessages::LOCKED,
            DisplayMessages::SCAN_MASTER,
            DisplayMessages::MASTER_ID,
            DisplayMessages::ENTER_PIN,
            DisplayMessages::PIN_SAVED,
            DisplayMessages::MASTER_MODE,
            DisplayMessages::MASTER_MODE_HINT,
            DisplayMessages::EXITING,
            DisplayMessages::CARD_ADDED,
            DisplayMessages::CARD_DELETED,
            DisplayMessages::MEMORY_FULL,
            DisplayMessages::STORAGE_ERROR,
        ];

        for message in messages {
            assert!(!message.is_empty());
            assert!(message.is_ascii(), "{message:?} is not ASCII");
            assert!(
                message.len() <= DISPLAY_COLUMNS,
                "{message:?} is wider than the display"
            );
        }
    }
}
