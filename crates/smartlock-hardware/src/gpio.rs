//! Lock relay driven through a GPIO value file.
//!
//! Linux exposes exported GPIO lines as `/sys/class/gpio/gpioN/value`; writing
//! `1` or `0` switches the line. Any writable file works, which is how the
//! tests drive it.

use crate::error::{HardwareError, Result};
use crate::traits::LockActuator;
use crate::types::DeviceInfo;
use std::path::{Path, PathBuf};

/// Relay on a GPIO line.
#[derive(Debug)]
pub struct GpioRelay {
    value_path: PathBuf,
    active_low: bool,
    released: bool,
}

impl GpioRelay {
    /// Relay whose line is driven high to release the lock.
    pub fn new(value_path: impl Into<PathBuf>) -> Self {
        Self {
            value_path: value_path.into(),
            active_low: false,
            released: false,
        }
    }

    /// Invert the line level (low releases the lock).
    pub fn active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub fn value_path(&self) -> &Path {
        &self.value_path
    }

    async fn drive(&mut self, released: bool) -> Result<()> {
        let level: &[u8] = if released != self.active_low { b"1" } else { b"0" };
        tokio::fs::write(&self.value_path, level)
            .await
            .map_err(|e| {
                HardwareError::relay(format!("{}: {e}", self.value_path.display()))
            })?;
        self.released = released;
        Ok(())
    }
}

impl LockActuator for GpioRelay {
    async fn release(&mut self) -> Result<()> {
        self.drive(true).await
    }

    async fn engage(&mut self) -> Result<()> {
        self.drive(false).await
    }

    fn is_released(&self) -> bool {
        self.released
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("GPIO Relay", "Lock Relay")
            .with_port(self.value_path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_gpio_relay_writes_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value");
        let mut relay = GpioRelay::new(&path);

        relay.release().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"1");
        assert!(relay.is_released());

        relay.engage().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"0");
        assert!(!relay.is_released());
    }

    #[tokio::test]
    async fn test_gpio_relay_active_low() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value");
        let mut relay = GpioRelay::new(&path).active_low(true);

        relay.release().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"0");
    }

    #[tokio::test]
    async fn test_gpio_relay_unwritable_path() {
        let mut relay = GpioRelay::new("/nonexistent/gpio/value");
        assert!(matches!(
            relay.release().await,
            Err(HardwareError::Relay { .. })
        ));
        assert!(!relay.is_released());
    }
}
