//! Stdin console driving the mock peripherals.
//!
//! One command per line:
//!
//! ```text
//! key 1234O            press keys as printed on the keypad
//! card 172:61:255:160  present a card (decimal UID)
//! scan AC:3D:FF:A0     scan a barcode
//! ```

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use smartlock_core::CardUid;
use smartlock_hardware::mock::{MockKeypadHandle, MockLockActuatorHandle, MockRfidHandle, MockScannerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

pub const HELP: &str = "commands: key <keys> | card <a:b:c:d> | scan <text> | help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Keys(String),
    Card(CardUid),
    Scan(String),
    Help,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb {
            "key" | "k" if !rest.is_empty() => Ok(Self::Keys(rest.replace(' ', ""))),
            "card" | "c" if !rest.is_empty() => CardUid::parse_decimal(rest)
                .map(Self::Card)
                .map_err(|e| anyhow!(e)),
            "scan" | "s" if !rest.is_empty() => Ok(Self::Scan(rest.to_string())),
            "help" | "?" => Ok(Self::Help),
            "" => bail!("empty command"),
            _ => bail!("unknown command {line:?}"),
        }
    }
}

/// Handles for the mock devices the console drives.
#[derive(Debug)]
pub struct MockConsole {
    pub keypad: MockKeypadHandle,
    pub rfid: MockRfidHandle,
    pub scanner: MockScannerHandle,
}

impl MockConsole {
    /// Apply one command.
    pub async fn execute(&self, command: ConsoleCommand) -> Result<()> {
        match command {
            ConsoleCommand::Keys(keys) => self.keypad.type_str(&keys).await?,
            ConsoleCommand::Card(uid) => self.rfid.present(uid).await?,
            ConsoleCommand::Scan(code) => self.scanner.scan(code).await?,
            ConsoleCommand::Help => println!("{HELP}"),
        }
        Ok(())
    }

    /// Read commands from stdin until it closes.
    pub async fn run(self) {
        println!("{HELP}");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let result = match line.parse::<ConsoleCommand>() {
                        Ok(command) => self.execute(command).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        warn!(error = %e, "Console command failed");
                    }
                }
                Ok(None) => {
                    info!("Console input closed");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Console read failed");
                    return;
                }
            }
        }
    }
}

/// Log every relay change of the mock actuator.
pub async fn watch_relay(mut relay: MockLockActuatorHandle) {
    loop {
        if relay.wait_for(true).await.is_err() {
            return;
        }
        info!("Relay released");
        if relay.wait_for(false).await.is_err() {
            return;
        }
        info!("Relay engaged");
    }
}
