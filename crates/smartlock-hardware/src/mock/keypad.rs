//! Mock keypad implementation for testing and development.

use crate::{HardwareError, Result, traits::KeypadDevice, types::DeviceInfo};
use smartlock_keypad::Key;
use tokio::sync::mpsc;

/// Mock keypad device fed through a [`MockKeypadHandle`].
///
/// # Examples
///
/// ```
/// use smartlock_hardware::mock::MockKeypad;
/// use smartlock_hardware::traits::KeypadDevice;
/// use smartlock_keypad::Key;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.type_str("12O").await?;
///
///     assert_eq!(keypad.read_key().await?, Key::Digit(1));
///     assert_eq!(keypad.read_key().await?, Key::Digit(2));
///     assert_eq!(keypad.read_key().await?, Key::Enter);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    input_rx: mpsc::Receiver<Key>,
    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);

        let keypad = Self {
            input_rx,
            name: name.clone(),
        };
        let handle = MockKeypadHandle { input_tx, name };

        (keypad, handle)
    }
}

impl KeypadDevice for MockKeypad {
    async fn read_key(&mut self) -> Result<Key> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Keypad input channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Keypad 4x5").with_firmware_version("1.0.0"))
    }
}

/// Handle for controlling a mock keypad. Cloneable.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    input_tx: mpsc::Sender<Key>,
    name: String,
}

impl MockKeypadHandle {
    /// Send a key press to the mock keypad.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn press(&self, key: Key) -> Result<()> {
        self.input_tx
            .send(key)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Type the characters printed on the keys, e.g. `"1234O"`.
    ///
    /// # Errors
    ///
    /// Returns an error if a character is not on the keypad or the channel
    /// is closed.
    pub async fn type_str(&self, keys: &str) -> Result<()> {
        for c in keys.chars() {
            self.press(Key::from_char(c)?).await?;
        }
        Ok(())
    }

    /// Type a PIN followed by the confirm key.
    ///
    /// # Errors
    ///
    /// Returns an error if the PIN contains non-digits or the channel is closed.
    pub async fn enter_pin(&self, pin: &str) -> Result<()> {
        if !pin.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HardwareError::invalid_data(format!("not a PIN: {pin:?}")));
        }
        self.type_str(pin).await?;
        self.press(Key::Enter).await
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
