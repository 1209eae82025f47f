use std::time::Duration;

use anyhow::{Context, Result};
use smartlock_hardware::devices::{AnyKeypadDevice, AnyRfidDevice, AnyScannerDevice};
use smartlock_hardware::mock::{MockKeypad, MockLockActuator, MockRfid, MockScanner};
use smartlock_hardware::{
    AnyLockActuator, GpioRelay, PeripheralConfig, PeripheralManager, SerialKeypad, SerialRfid,
    SerialScanner,
};
use tracing::info;

use crate::config::{DeviceMode, DevicesConfig};
use crate::console::{self, MockConsole};

/// Input devices, the relay and, in mock mode, the console driving them.
#[derive(Debug)]
pub struct Peripherals {
    pub manager: PeripheralManager,
    pub actuator: AnyLockActuator,
    pub console: Option<MockConsole>,
}

pub async fn build(config: &DevicesConfig) -> Result<Peripherals> {
    let mut manager = PeripheralManager::new(PeripheralConfig {
        keypad_enabled: config.mode == DeviceMode::Mock || config.keypad.is_some(),
        rfid_enabled: config.mode == DeviceMode::Mock || config.rfid.is_some(),
        scanner_enabled: config.mode == DeviceMode::Mock || config.scanner.is_some(),
        rfid_poll_interval: Duration::from_millis(config.rfid_poll_ms),
    });

    let console = match config.mode {
        DeviceMode::Mock => {
            let (keypad, keypad_handle) = MockKeypad::new();
            let (rfid, rfid_handle) = MockRfid::new();
            let (scanner, scanner_handle) = MockScanner::new();
            manager.register_keypad(AnyKeypadDevice::Mock(keypad));
            manager.register_rfid(AnyRfidDevice::Mock(rfid));
            manager.register_scanner(AnyScannerDevice::Mock(scanner));
            info!("Using mock input devices");

            Some(MockConsole {
                keypad: keypad_handle,
                rfid: rfid_handle,
                scanner: scanner_handle,
            })
        }
        DeviceMode::Serial => {
            if let Some(path) = &config.keypad {
                let keypad = SerialKeypad::open(path)
                    .await
                    .with_context(|| format!("keypad {}", path.display()))?;
                manager.register_keypad(AnyKeypadDevice::Serial(keypad));
            }
            if let Some(path) = &config.rfid {
                let rfid = SerialRfid::open(path)
                    .await
                    .with_context(|| format!("NFC reader {}", path.display()))?;
                manager.register_rfid(AnyRfidDevice::Serial(rfid));
            }
            if let Some(path) = &config.scanner {
                let scanner = SerialScanner::open(path)
                    .await
                    .with_context(|| format!("scanner {}", path.display()))?;
                manager.register_scanner(AnyScannerDevice::Serial(scanner));
            }
            None
        }
    };

    let actuator = match &config.relay {
        Some(path) => {
            info!(path = %path.display(), "Using GPIO relay");
            AnyLockActuator::Gpio(GpioRelay::new(path).active_low(config.relay_active_low))
        }
        None => {
            let (relay, handle) = MockLockActuator::new();
            tokio::spawn(console::watch_relay(handle));
            info!("Using mock relay");
            AnyLockActuator::Mock(relay)
        }
    };

    Ok(Peripherals {
        manager,
        actuator,
        console,
    })
}
