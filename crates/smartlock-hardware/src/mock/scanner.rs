//! Mock barcode scanner implementation for testing and development.

use crate::{HardwareError, Result, traits::ScannerDevice, types::DeviceInfo};
use tokio::sync::mpsc;

/// Mock barcode scanner fed through a [`MockScannerHandle`].
#[derive(Debug)]
pub struct MockScanner {
    code_rx: mpsc::Receiver<String>,
    name: String,
}

impl MockScanner {
    pub fn new() -> (Self, MockScannerHandle) {
        Self::with_name("Mock Barcode Scanner".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockScannerHandle) {
        let (code_tx, code_rx) = mpsc::channel(32);
        (
            Self {
                code_rx,
                name: name.clone(),
            },
            MockScannerHandle { code_tx, name },
        )
    }
}

impl ScannerDevice for MockScanner {
    async fn read_barcode(&mut self) -> Result<String> {
        self.code_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("Scanner channel closed"))
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock PS/2 Scanner"))
    }
}

/// Handle for simulating scans. Cloneable.
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    code_tx: mpsc::Sender<String>,
    name: String,
}

impl MockScannerHandle {
    /// Simulate scanning a barcode.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped.
    pub async fn scan(&self, code: impl Into<String>) -> Result<()> {
        self.code_tx
            .send(code.into())
            .await
            .map_err(|_| HardwareError::disconnected("Scanner channel closed"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
