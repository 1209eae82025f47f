//! Lock settings and user card table over persistent memory.
//!
//! # Memory layout
//!
//! | Field           | Offset | Size |
//! |-----------------|--------|------|
//! | first_run       | 0      | 1    |
//! | admin_password  | 1      | 8    |
//! | nfc_enabled     | 9      | 1    |
//! | pin_enabled     | 10     | 1    |
//! | scanner_enabled | 11     | 1    |
//! | pin_code        | 12     | 8    |
//! | master_card     | 20     | 4    |
//! | lock_time       | 24     | 1    |
//! | card_count      | 25     | 1    |
//! | user_cards      | 26     | 4*n  |
//!
//! Every mutating method commits before returning.

use crate::eeprom::Eeprom;
use crate::error::{StorageError, StorageResult};
use serde::Serialize;
use smartlock_core::constants::{
    ADMIN_PASSWORD_LEN, ADMIN_PASSWORD_OFFSET, CARD_UID_LEN, DEFAULT_ADMIN_PASSWORD,
    DEFAULT_LOCK_TIME_MINUTES, EEPROM_SIZE, FIRST_RUN_OFFSET, LOCK_TIME_OFFSET,
    MASTER_CARD_OFFSET, MAX_USER_CARDS, NFC_ENABLED_OFFSET, PIN_CODE_LEN, PIN_CODE_OFFSET,
    PIN_ENABLED_OFFSET, SCANNER_ENABLED_OFFSET, USER_CARD_COUNT_OFFSET, USER_CARDS_OFFSET,
};
use smartlock_core::{AdminPassword, CardUid, Feature, LockTime, PinCode};
use tracing::{debug, info, warn};

/// Result of presenting a card in enrollment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardToggle {
    Added,
    Removed,
}

/// Snapshot of the lock's settings for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockSettings {
    pub first_run: bool,
    pub nfc_enabled: bool,
    pub pin_enabled: bool,
    pub scanner_enabled: bool,
    pub pin_configured: bool,
    pub master_card_configured: bool,
    pub lock_time_minutes: u8,
    pub card_count: usize,
    pub capacity: usize,
    pub memory_usage_percent: u8,
}

fn feature_offset(feature: Feature) -> usize {
    match feature {
        Feature::Nfc => NFC_ENABLED_OFFSET,
        Feature::Pin => PIN_ENABLED_OFFSET,
        Feature::Scanner => SCANNER_ENABLED_OFFSET,
    }
}

fn card_offset(index: usize) -> usize {
    USER_CARDS_OFFSET + index * CARD_UID_LEN
}

/// Typed access to the lock's persistent state.
pub struct LockStore {
    eeprom: Box<dyn Eeprom>,
}

impl LockStore {
    /// Load the store, factory-resetting an uninitialised image.
    ///
    /// # Errors
    /// Returns `StorageError::Configuration` if the image is smaller than the
    /// layout needs.
    pub fn open(eeprom: impl Eeprom + 'static) -> StorageResult<Self> {
        if eeprom.len() < EEPROM_SIZE {
            return Err(StorageError::Configuration(format!(
                "memory image must be at least {EEPROM_SIZE} bytes, got {}",
                eeprom.len()
            )));
        }

        let mut store = Self {
            eeprom: Box::new(eeprom),
        };

        if let Some(reason) = store.layout_problem()? {
            warn!(reason, "Memory image not initialised, restoring defaults");
            store.factory_reset()?;
        }

        Ok(store)
    }

    fn layout_problem(&self) -> StorageResult<Option<&'static str>> {
        if self.read_byte(FIRST_RUN_OFFSET)? > 1 {
            return Ok(Some("first-run flag out of range"));
        }
        for feature in Feature::ALL {
            if self.read_byte(feature_offset(feature))? > 1 {
                return Ok(Some("feature flag out of range"));
            }
        }
        if usize::from(self.read_byte(USER_CARD_COUNT_OFFSET)?) > self.capacity() {
            return Ok(Some("card count exceeds capacity"));
        }
        if self.admin_password().is_err() {
            return Ok(Some("admin password unreadable"));
        }
        Ok(None)
    }

    /// Restore defaults: setup wizard pending, password "admin", every
    /// feature enabled, 5 minute lockout, no PIN, no master, no cards.
    pub fn factory_reset(&mut self) -> StorageResult<()> {
        let zeros = vec![0u8; self.eeprom.len()];
        self.eeprom.write(0, &zeros)?;

        self.eeprom.write(FIRST_RUN_OFFSET, &[1])?;
        let password = AdminPassword::new(DEFAULT_ADMIN_PASSWORD)?;
        self.eeprom.write(ADMIN_PASSWORD_OFFSET, &password.to_field())?;
        for feature in Feature::ALL {
            self.eeprom.write(feature_offset(feature), &[1])?;
        }
        self.eeprom
            .write(LOCK_TIME_OFFSET, &[DEFAULT_LOCK_TIME_MINUTES])?;
        self.eeprom.commit()?;

        info!("Lock store reset to factory defaults");
        Ok(())
    }

    pub fn is_first_run(&self) -> StorageResult<bool> {
        Ok(self.read_byte(FIRST_RUN_OFFSET)? == 1)
    }

    /// Store the master card and PIN chosen in the setup wizard and leave
    /// setup mode.
    pub fn complete_first_run(&mut self, master: CardUid, pin: &PinCode) -> StorageResult<()> {
        self.eeprom.write(MASTER_CARD_OFFSET, master.as_bytes())?;
        self.eeprom.write(PIN_CODE_OFFSET, &pin.to_field())?;
        self.eeprom.write(FIRST_RUN_OFFSET, &[0])?;
        self.eeprom.commit()?;

        info!(master = %master, "Setup completed");
        Ok(())
    }

    pub fn admin_password(&self) -> StorageResult<AdminPassword> {
        let mut field = [0u8; ADMIN_PASSWORD_LEN];
        self.eeprom.read(ADMIN_PASSWORD_OFFSET, &mut field)?;
        Ok(AdminPassword::from_field(&field)?)
    }

    pub fn set_admin_password(&mut self, password: &AdminPassword) -> StorageResult<()> {
        self.write_committed(ADMIN_PASSWORD_OFFSET, &password.to_field())?;
        info!("Admin password changed");
        Ok(())
    }

    pub fn verify_admin_password(&self, candidate: &str) -> StorageResult<bool> {
        Ok(self.admin_password()?.verify(candidate))
    }

    /// The shared PIN, `None` before setup.
    pub fn pin_code(&self) -> StorageResult<Option<PinCode>> {
        let mut field = [0u8; PIN_CODE_LEN];
        self.eeprom.read(PIN_CODE_OFFSET, &mut field)?;
        Ok(PinCode::from_field(&field)?)
    }

    pub fn set_pin_code(&mut self, pin: &PinCode) -> StorageResult<()> {
        self.write_committed(PIN_CODE_OFFSET, &pin.to_field())?;
        info!("PIN code changed");
        Ok(())
    }

    /// Check an entered PIN. Always false when no PIN is configured.
    pub fn verify_pin(&self, entered: &str) -> StorageResult<bool> {
        Ok(self
            .pin_code()?
            .is_some_and(|pin| !entered.is_empty() && pin.verify(entered)))
    }

    pub fn feature_enabled(&self, feature: Feature) -> StorageResult<bool> {
        Ok(self.read_byte(feature_offset(feature))? == 1)
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) -> StorageResult<()> {
        self.write_committed(feature_offset(feature), &[u8::from(enabled)])?;
        info!(feature = %feature, enabled, "Feature updated");
        Ok(())
    }

    /// Flip a feature and return its new state.
    pub fn toggle_feature(&mut self, feature: Feature) -> StorageResult<bool> {
        let enabled = !self.feature_enabled(feature)?;
        self.set_feature(feature, enabled)?;
        Ok(enabled)
    }

    /// The master card, `None` before setup.
    pub fn master_card(&self) -> StorageResult<Option<CardUid>> {
        let mut bytes = [0u8; CARD_UID_LEN];
        self.eeprom.read(MASTER_CARD_OFFSET, &mut bytes)?;
        let uid = CardUid::new(bytes);
        Ok((!uid.is_zero()).then_some(uid))
    }

    pub fn is_master_card(&self, uid: &CardUid) -> StorageResult<bool> {
        Ok(self.master_card()?.is_some_and(|master| master == *uid))
    }

    pub fn lock_time(&self) -> StorageResult<LockTime> {
        Ok(LockTime::from_minutes(self.read_byte(LOCK_TIME_OFFSET)?))
    }

    pub fn set_lock_time(&mut self, lock_time: LockTime) -> StorageResult<()> {
        self.write_committed(LOCK_TIME_OFFSET, &[lock_time.minutes()])?;
        info!(minutes = lock_time.minutes(), "Lock time changed");
        Ok(())
    }

    /// Enrolled user cards in table order.
    pub fn cards(&self) -> StorageResult<Vec<CardUid>> {
        let count = self.card_count()?;
        let mut raw = vec![0u8; count * CARD_UID_LEN];
        self.eeprom.read(USER_CARDS_OFFSET, &mut raw)?;
        raw.chunks_exact(CARD_UID_LEN)
            .map(|chunk| CardUid::from_slice(chunk).map_err(StorageError::from))
            .collect()
    }

    pub fn card_count(&self) -> StorageResult<usize> {
        Ok(usize::from(self.read_byte(USER_CARD_COUNT_OFFSET)?))
    }

    /// Maximum number of user cards the image can hold.
    pub fn capacity(&self) -> usize {
        let slots = self.eeprom.len().saturating_sub(USER_CARDS_OFFSET) / CARD_UID_LEN;
        slots.min(MAX_USER_CARDS)
    }

    pub fn contains_card(&self, uid: &CardUid) -> StorageResult<bool> {
        Ok(self.position(uid)?.is_some())
    }

    /// Enroll an unknown card or remove a known one.
    ///
    /// # Errors
    /// Returns `StorageError::CardTableFull` when adding to a full table.
    pub fn toggle_card(&mut self, uid: CardUid) -> StorageResult<CardToggle> {
        if self.remove_card(&uid)? {
            return Ok(CardToggle::Removed);
        }

        let count = self.card_count()?;
        let capacity = self.capacity();
        if count >= capacity {
            warn!(card = %uid, capacity, "Card table full");
            return Err(StorageError::CardTableFull { capacity });
        }

        self.eeprom.write(card_offset(count), uid.as_bytes())?;
        self.eeprom.write(USER_CARD_COUNT_OFFSET, &[count as u8 + 1])?;
        self.eeprom.commit()?;

        info!(card = %uid, count = count + 1, "Card added");
        Ok(CardToggle::Added)
    }

    /// Remove a card, moving the last entry into its slot.
    ///
    /// Returns whether the card was enrolled.
    pub fn remove_card(&mut self, uid: &CardUid) -> StorageResult<bool> {
        let Some(index) = self.position(uid)? else {
            return Ok(false);
        };

        let last = self.card_count()? - 1;
        if index != last {
            let mut moved = [0u8; CARD_UID_LEN];
            self.eeprom.read(card_offset(last), &mut moved)?;
            self.eeprom.write(card_offset(index), &moved)?;
        }
        self.eeprom.write(card_offset(last), &[0u8; CARD_UID_LEN])?;
        self.eeprom.write(USER_CARD_COUNT_OFFSET, &[last as u8])?;
        self.eeprom.commit()?;

        info!(card = %uid, count = last, "Card removed");
        Ok(true)
    }

    /// Share of the card table in use, 0-100.
    pub fn memory_usage_percent(&self) -> StorageResult<u8> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Ok(100);
        }
        Ok((self.card_count()? * 100 / capacity) as u8)
    }

    pub fn settings(&self) -> StorageResult<LockSettings> {
        Ok(LockSettings {
            first_run: self.is_first_run()?,
            nfc_enabled: self.feature_enabled(Feature::Nfc)?,
            pin_enabled: self.feature_enabled(Feature::Pin)?,
            scanner_enabled: self.feature_enabled(Feature::Scanner)?,
            pin_configured: self.pin_code()?.is_some(),
            master_card_configured: self.master_card()?.is_some(),
            lock_time_minutes: self.lock_time()?.minutes(),
            card_count: self.card_count()?,
            capacity: self.capacity(),
            memory_usage_percent: self.memory_usage_percent()?,
        })
    }

    fn position(&self, uid: &CardUid) -> StorageResult<Option<usize>> {
        Ok(self.cards()?.iter().position(|card| card == uid))
    }

    fn read_byte(&self, offset: usize) -> StorageResult<u8> {
        let mut byte = [0u8; 1];
        self.eeprom.read(offset, &mut byte)?;
        Ok(byte[0])
    }

    fn write_committed(&mut self, offset: usize, data: &[u8]) -> StorageResult<()> {
        self.eeprom.write(offset, data)?;
        self.eeprom.commit()?;
        debug!(offset, len = data.len(), "Memory updated");
        Ok(())
    }
}

impl std::fmt::Debug for LockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockStore")
            .field("size", &self.eeprom.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}
