//! Peripheral device manager.
//!
//! The `PeripheralManager` runs every registered input device in its own
//! task and funnels what they read into a single event stream for the
//! access engine.
//!
//! ```text
//! ┌──────────┐       ┌─────────────────┐
//! │ Keypad   │──────►│                 │
//! │ Task     │       │  Event Channel  │
//! └──────────┘       │  (mpsc)         │──────► Access engine
//! ┌──────────┐       │                 │
//! │ NFC      │──────►│                 │
//! │ Task     │       │                 │
//! └──────────┘       │                 │
//! ┌──────────┐       │                 │
//! │ Scanner  │──────►│                 │
//! │ Task     │       └─────────────────┘
//! └──────────┘
//! ```
//!
//! Read errors that only spoil a single read are reported as
//! [`PeripheralEvent::DeviceError`] and the task keeps going; a lost device
//! reports the error and its task ends.
//!
//! # Examples
//!
//! ```no_run
//! use smartlock_hardware::manager::{PeripheralManager, PeripheralConfig};
//! use smartlock_hardware::devices::AnyKeypadDevice;
//! use smartlock_hardware::mock::MockKeypad;
//!
//! #[tokio::main]
//! async fn main() -> smartlock_hardware::Result<()> {
//!     let mut manager = PeripheralManager::new(PeripheralConfig::default());
//!
//!     let (keypad, _handle) = MockKeypad::new();
//!     manager.register_keypad(AnyKeypadDevice::Mock(keypad));
//!
//!     let mut handle = manager.start();
//!     while let Some(event) = handle.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::devices::{AnyKeypadDevice, AnyRfidDevice, AnyScannerDevice};
use crate::traits::{CardData, KeypadDevice, RfidDevice, ScannerDevice};
use crate::types::DeviceType;
use crate::error::Result;
use smartlock_core::constants::NFC_POLL_INTERVAL_MS;
use smartlock_keypad::Key;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Capacity of the shared event channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Minimum delay between keypad and scanner reads (100 Hz maximum).
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pause before retrying a send into a full channel.
const BACKPRESSURE_DELAY: Duration = Duration::from_millis(100);

/// Unified event from any peripheral device.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum PeripheralEvent {
    /// Key pressed on the keypad.
    KeyPressed(Key),

    /// Card presented to the NFC reader.
    CardRead(CardData),

    /// Line read from the barcode scanner.
    BarcodeScanned(String),

    /// Device error occurred.
    DeviceError {
        /// Type of device that encountered the error.
        device_type: DeviceType,

        /// Error message.
        error: String,

        /// Whether the device task stopped because of it.
        fatal: bool,
    },
}

/// Configuration for peripheral devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralConfig {
    /// Enable keypad device.
    pub keypad_enabled: bool,

    /// Enable NFC reader device.
    pub rfid_enabled: bool,

    /// Enable barcode scanner device.
    pub scanner_enabled: bool,

    /// Minimum time between two card reads.
    ///
    /// Also debounces a card left lying on the reader.
    pub rfid_poll_interval: Duration,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            keypad_enabled: true,
            rfid_enabled: true,
            scanner_enabled: true,
            rfid_poll_interval: Duration::from_millis(NFC_POLL_INTERVAL_MS),
        }
    }
}

/// Statistics about registered peripherals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeripheralStats {
    pub keypad_connected: bool,
    pub rfid_connected: bool,
    pub scanner_connected: bool,
}

/// Handle for receiving events from running peripheral tasks.
pub struct PeripheralHandle {
    event_rx: mpsc::Receiver<PeripheralEvent>,
    tasks: JoinSet<Result<()>>,
}

impl PeripheralHandle {
    /// Receive the next event from any peripheral device.
    ///
    /// Returns `None` once every device task has ended.
    pub async fn recv(&mut self) -> Option<PeripheralEvent> {
        self.event_rx.recv().await
    }

    /// Number of device tasks still running.
    pub fn running_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Abort all device tasks and wait for them to terminate.
    ///
    /// Task errors and panics are logged, not returned.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        if error_count + panic_count > 0 {
            warn!(
                errors = error_count,
                panics = panic_count,
                "Peripheral tasks ended abnormally"
            );
        }
        info!("Peripheral manager stopped");

        Ok(())
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(_)) => TaskTermination::Error,
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(_) => TaskTermination::Panic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    Cancelled,
    Panic,
}

/// Outcome of forwarding one device read.
enum Flow {
    Continue,
    Stop,
}

/// Manages all input peripherals.
///
/// # Lifecycle
///
/// 1. Create manager with configuration
/// 2. Register devices using `register_*` methods
/// 3. Call `start()` to spawn device tasks and get event handle
/// 4. Use handle to receive events
/// 5. Device tasks run until the device is lost or the handle shuts down
pub struct PeripheralManager {
    keypad: Option<AnyKeypadDevice>,
    rfid: Option<AnyRfidDevice>,
    scanner: Option<AnyScannerDevice>,
    config: PeripheralConfig,
}

impl PeripheralManager {
    pub fn new(config: PeripheralConfig) -> Self {
        Self {
            keypad: None,
            rfid: None,
            scanner: None,
            config,
        }
    }

    /// Register keypad device.
    pub fn register_keypad(&mut self, device: AnyKeypadDevice) {
        self.keypad = Some(device);
    }

    /// Register NFC reader device.
    pub fn register_rfid(&mut self, device: AnyRfidDevice) {
        self.rfid = Some(device);
    }

    /// Register barcode scanner device.
    pub fn register_scanner(&mut self, device: AnyScannerDevice) {
        self.scanner = Some(device);
    }

    /// Spawn a task per enabled, registered device and return the event
    /// handle.
    pub fn start(mut self) -> PeripheralHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let mut tasks = JoinSet::new();

        if self.config.keypad_enabled
            && let Some(device) = self.keypad.take()
        {
            tasks.spawn(Self::keypad_task(device, event_tx.clone()));
        }

        if self.config.rfid_enabled
            && let Some(device) = self.rfid.take()
        {
            let interval = self.config.rfid_poll_interval;
            tasks.spawn(Self::rfid_task(device, event_tx.clone(), interval));
        }

        if self.config.scanner_enabled
            && let Some(device) = self.scanner.take()
        {
            tasks.spawn(Self::scanner_task(device, event_tx.clone()));
        }

        info!(devices = tasks.len(), "Peripheral manager started");

        PeripheralHandle { event_rx, tasks }
    }

    /// Check if specific device type is enabled.
    pub fn is_device_enabled(&self, device_type: DeviceType) -> bool {
        match device_type {
            DeviceType::Keypad => self.config.keypad_enabled,
            DeviceType::Rfid => self.config.rfid_enabled,
            DeviceType::Scanner => self.config.scanner_enabled,
        }
    }

    /// Which devices are currently registered.
    pub fn get_stats(&self) -> PeripheralStats {
        PeripheralStats {
            keypad_connected: self.keypad.is_some(),
            rfid_connected: self.rfid.is_some(),
            scanner_connected: self.scanner.is_some(),
        }
    }

    async fn keypad_task(
        mut device: AnyKeypadDevice,
        tx: mpsc::Sender<PeripheralEvent>,
    ) -> Result<()> {
        loop {
            let start = tokio::time::Instant::now();
            let read = device.read_key().await.map(PeripheralEvent::KeyPressed);
            if let Flow::Stop = Self::forward(&tx, DeviceType::Keypad, read).await? {
                return Ok(());
            }
            Self::rate_limit(start, MIN_POLL_INTERVAL).await;
        }
    }

    async fn rfid_task(
        mut device: AnyRfidDevice,
        tx: mpsc::Sender<PeripheralEvent>,
        interval: Duration,
    ) -> Result<()> {
        loop {
            let start = tokio::time::Instant::now();
            let read = device.read_card().await.map(PeripheralEvent::CardRead);
            if let Flow::Stop = Self::forward(&tx, DeviceType::Rfid, read).await? {
                return Ok(());
            }
            Self::rate_limit(start, interval).await;
        }
    }

    async fn scanner_task(
        mut device: AnyScannerDevice,
        tx: mpsc::Sender<PeripheralEvent>,
    ) -> Result<()> {
        loop {
            let start = tokio::time::Instant::now();
            let read = device
                .read_barcode()
                .await
                .map(PeripheralEvent::BarcodeScanned);
            if let Flow::Stop = Self::forward(&tx, DeviceType::Scanner, read).await? {
                return Ok(());
            }
            Self::rate_limit(start, MIN_POLL_INTERVAL).await;
        }
    }

    /// Send a read result to the event channel.
    ///
    /// Returns `Err` when a fatal device error should end the task and
    /// `Flow::Stop` when the receiving side has gone away.
    async fn forward(
        tx: &mpsc::Sender<PeripheralEvent>,
        device_type: DeviceType,
        read: Result<PeripheralEvent>,
    ) -> Result<Flow> {
        let (event, fatal_error) = match read {
            Ok(event) => (event, None),
            Err(e) => {
                let fatal = e.is_fatal();
                if fatal {
                    warn!(device = %device_type, error = %e, "Device lost");
                } else {
                    debug!(device = %device_type, error = %e, "Device read failed");
                }
                let event = PeripheralEvent::DeviceError {
                    device_type,
                    error: e.to_string(),
                    fatal,
                };
                (event, fatal.then_some(e))
            }
        };

        let delivered = match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tokio::time::sleep(BACKPRESSURE_DELAY).await;
                tx.send(event).await.is_ok()
            }
            Err(TrySendError::Closed(_)) => false,
        };

        match fatal_error {
            Some(e) => Err(e),
            None if delivered => Ok(Flow::Continue),
            None => Ok(Flow::Stop),
        }
    }

    async fn rate_limit(start: tokio::time::Instant, interval: Duration) {
        let elapsed = start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}

impl std::fmt::Debug for PeripheralManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeripheralManager")
            .field("stats", &self.get_stats())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockKeypad, MockRfid, MockScanner};
    use smartlock_core::CardUid;

    fn fast_config() -> PeripheralConfig {
        PeripheralConfig {
            rfid_poll_interval: Duration::from_millis(1),
            ..PeripheralConfig::default()
        }
    }

    #[test]
    fn test_peripheral_config_default() {
        let config = PeripheralConfig::default();
        assert!(config.keypad_enabled);
        assert!(config.rfid_enabled);
        assert!(config.scanner_enabled);
        assert_eq!(config.rfid_poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_manager_register_and_stats() {
        let mut manager = PeripheralManager::new(PeripheralConfig::default());
        let stats = manager.get_stats();
        assert!(!stats.keypad_connected && !stats.rfid_connected && !stats.scanner_connected);

        let (keypad, _) = MockKeypad::new();
        manager.register_keypad(AnyKeypadDevice::Mock(keypad));
        let (scanner, _) = MockScanner::new();
        manager.register_scanner(AnyScannerDevice::Mock(scanner));

        let stats = manager.get_stats();
        assert!(stats.keypad_connected);
        assert!(!stats.rfid_connected);
        assert!(stats.scanner_connected);
    }

    #[test]
    fn test_manager_debug_shows_stats() {
        let mut manager = PeripheralManager::new(PeripheralConfig::default());
        let (keypad, _handle) = MockKeypad::new();
        manager.register_keypad(AnyKeypadDevice::Mock(keypad));

        let text = format!("{manager:?}");
        assert!(text.starts_with("PeripheralManager"));
        assert!(text.contains("keypad_connected: true"));
        assert!(text.contains("rfid_connected: false"));
    }

    #[test]
    fn test_manager_is_device_enabled() {
        let manager = PeripheralManager::new(PeripheralConfig {
            scanner_enabled: false,
            ..PeripheralConfig::default()
        });

        assert!(manager.is_device_enabled(DeviceType::Keypad));
        assert!(manager.is_device_enabled(DeviceType::Rfid));
        assert!(!manager.is_device_enabled(DeviceType::Scanner));
    }

    #[tokio::test]
    async fn test_manager_forwards_all_device_events() {
        let mut manager = PeripheralManager::new(fast_config());

        let (keypad, keypad_handle) = MockKeypad::new();
        manager.register_keypad(AnyKeypadDevice::Mock(keypad));
        let (rfid, rfid_handle) = MockRfid::new();
        manager.register_rfid(AnyRfidDevice::Mock(rfid));
        let (scanner, scanner_handle) = MockScanner::new();
        manager.register_scanner(AnyScannerDevice::Mock(scanner));

        let mut handle = manager.start();
        assert_eq!(handle.running_tasks(), 3);

        keypad_handle.press(Key::Digit(7)).await.unwrap();
        match handle.recv().await.unwrap() {
            PeripheralEvent::KeyPressed(key) => assert_eq!(key, Key::Digit(7)),
            other => panic!("unexpected event: {other:?}"),
        }

        let uid = CardUid::new([1, 2, 3, 4]);
        rfid_handle.present(uid).await.unwrap();
        match handle.recv().await.unwrap() {
            PeripheralEvent::CardRead(card) => assert_eq!(card.uid, uid),
            other => panic!("unexpected event: {other:?}"),
        }

        scanner_handle.scan("AC:3D:FF:A0").await.unwrap();
        match handle.recv().await.unwrap() {
            PeripheralEvent::BarcodeScanned(code) => assert_eq!(code, "AC:3D:FF:A0"),
            other => panic!("unexpected event: {other:?}"),
        }

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_device_is_not_started() {
        let mut manager = PeripheralManager::new(PeripheralConfig {
            keypad_enabled: false,
            ..fast_config()
        });
        let (keypad, _keypad_handle) = MockKeypad::new();
        manager.register_keypad(AnyKeypadDevice::Mock(keypad));

        let handle = manager.start();
        assert_eq!(handle.running_tasks(), 0);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_lost_device_reports_fatal_error() {
        let mut manager = PeripheralManager::new(fast_config());
        let (keypad, keypad_handle) = MockKeypad::new();
        manager.register_keypad(AnyKeypadDevice::Mock(keypad));

        let mut handle = manager.start();
        drop(keypad_handle);

        match handle.recv().await.unwrap() {
            PeripheralEvent::DeviceError {
                device_type, fatal, ..
            } => {
                assert_eq!(device_type, DeviceType::Keypad);
                assert!(fatal);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // The only task ended, so the channel closes.
        assert!(handle.recv().await.is_none());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_manager_graceful_shutdown_without_devices() {
        let manager = PeripheralManager::new(PeripheralConfig::default());
        let handle = manager.start();
        handle.shutdown().await.unwrap();
    }
}
