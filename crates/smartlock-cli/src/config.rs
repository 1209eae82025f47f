//! Daemon configuration file.
//!
//! Every section and field is optional; a missing file means all defaults.
//!
//! ```toml
//! [storage]
//! eeprom_path = "/var/lib/smartlock/eeprom.bin"
//! database_path = "/var/lib/smartlock/access.db"
//!
//! [admin]
//! enabled = true
//! listen = "0.0.0.0:80"
//!
//! [devices]
//! mode = "serial"
//! keypad = "/dev/ttyUSB0"
//! scanner = "/dev/ttyUSB1"
//! rfid = "/dev/ttyUSB2"
//! relay = "/sys/class/gpio/gpio17/value"
//!
//! [timing]
//! unlock_secs = 3
//! message_secs = 3
//!
//! [logging]
//! filter = "info,smartlock_engine=debug"
//! format = "json"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use smartlock_core::constants::{MESSAGE_DURATION_MS, NFC_POLL_INTERVAL_MS, UNLOCK_DURATION_MS};

pub const DEFAULT_CONFIG_PATH: &str = "smartlock.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub devices: DevicesConfig,
    pub timing: TimingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// EEPROM image holding settings and the card table.
    pub eeprom_path: PathBuf,

    /// SQLite access log; `None` disables logging of attempts.
    pub database_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            eeprom_path: PathBuf::from("smartlock.eeprom"),
            database_path: Some(PathBuf::from("smartlock.db")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    pub enabled: bool,
    pub listen: SocketAddr,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Where peripheral input comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    /// Devices simulated from commands typed on stdin.
    #[default]
    Mock,
    /// Serial streams from the keyboard listener and reader bridge.
    Serial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DevicesConfig {
    pub mode: DeviceMode,

    /// Keypad stream (serial mode).
    pub keypad: Option<PathBuf>,

    /// Barcode scanner stream (serial mode).
    pub scanner: Option<PathBuf>,

    /// NFC reader bridge stream (serial mode).
    pub rfid: Option<PathBuf>,

    /// GPIO value file for the door relay; mock relay when unset.
    pub relay: Option<PathBuf>,

    pub relay_active_low: bool,

    /// Minimum time between two card reads.
    pub rfid_poll_ms: u64,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            mode: DeviceMode::Mock,
            keypad: None,
            scanner: None,
            rfid: None,
            relay: None,
            relay_active_low: false,
            rfid_poll_ms: NFC_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Relay release time after a grant.
    pub unlock_secs: u64,

    /// How long "ACCESS GRANTED" / "ACCESS DENIED" stay on screen.
    pub message_secs: u64,

    pub tick_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            unlock_secs: UNLOCK_DURATION_MS / 1_000,
            message_secs: MESSAGE_DURATION_MS / 1_000,
            tick_ms: 100,
        }
    }
}

impl TimingConfig {
    pub fn unlock_duration(&self) -> Duration {
        Duration::from_secs(self.unlock_secs)
    }

    pub fn message_duration(&self) -> Duration {
        Duration::from_secs(self.message_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults if it does not exist.
    ///
    /// Returns the config and whether the file was found.
    pub fn load(path: &Path) -> Result<(Self, bool)> {
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config =
            Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        Ok((config, true))
    }

    pub fn validate(&self) -> Result<()> {
        if self.devices.mode == DeviceMode::Serial
            && self.devices.keypad.is_none()
            && self.devices.scanner.is_none()
            && self.devices.rfid.is_none()
        {
            bail!("serial device mode needs at least one of keypad, scanner or rfid");
        }
        if self.timing.tick_ms == 0 {
            bail!("timing.tick_ms must be greater than zero");
        }
        Ok(())
    }
}
