//! Mock NFC reader implementation for testing and development.

use crate::{
    HardwareError, Result,
    traits::{CardData, RfidDevice},
    types::DeviceInfo,
};
use smartlock_core::CardUid;
use tokio::sync::mpsc;

/// Mock NFC reader. Cards are presented through a [`MockRfidHandle`].
///
/// # Examples
///
/// ```
/// use smartlock_core::CardUid;
/// use smartlock_hardware::mock::MockRfid;
/// use smartlock_hardware::traits::RfidDevice;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (mut reader, handle) = MockRfid::new();
///
///     handle.present(CardUid::new([0x04, 0xAB, 0xCD, 0xEF])).await?;
///
///     let card = reader.read_card().await?;
///     assert_eq!(card.uid.to_hex(), "04:AB:CD:EF");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    card_rx: mpsc::Receiver<CardData>,
    name: String,
}

impl MockRfid {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock NFC Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let (card_tx, card_rx) = mpsc::channel(32);

        let reader = Self {
            card_rx,
            name: name.clone(),
        };
        let handle = MockRfidHandle { card_tx, name };

        (reader, handle)
    }
}

impl RfidDevice for MockRfid {
    async fn read_card(&mut self) -> Result<CardData> {
        self.card_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("RFID event channel closed"))
    }

    async fn is_card_present(&self) -> Result<bool> {
        // Best effort: a queued presentation counts as a card in the field.
        Ok(!self.card_rx.is_empty())
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock PN532").with_firmware_version("1.6"))
    }
}

/// Handle for presenting cards to a mock reader. Cloneable.
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    card_tx: mpsc::Sender<CardData>,
    name: String,
}

impl MockRfidHandle {
    /// Present a 4-byte card.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present(&self, uid: CardUid) -> Result<()> {
        self.send(CardData::new(uid)).await
    }

    /// Present a card with a raw 4-10 byte UID.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid UID length or if the reader has been
    /// dropped.
    pub async fn present_raw(&self, raw: &[u8]) -> Result<()> {
        self.send(CardData::from_raw(raw)?).await
    }

    async fn send(&self, card: CardData) -> Result<()> {
        self.card_tx
            .send(card)
            .await
            .map_err(|_| HardwareError::disconnected("RFID event channel closed"))
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
