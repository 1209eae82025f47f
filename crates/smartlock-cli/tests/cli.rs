use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("smartlockd").unwrap();
    cmd.env_remove("SMARTLOCK_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("smartlock.toml");
    let eeprom = dir.path().join("eeprom.bin");
    let database = dir.path().join("access.db");
    let text = format!(
        "[storage]\neeprom_path = {:?}\ndatabase_path = {:?}\n\n[logging]\nfilter = \"warn\"\n{extra}",
        eeprom.display().to_string(),
        database.display().to_string()
    );
    std::fs::write(&path, text).unwrap();
    path
}

fn config_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn help_lists_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("reset"))
        .stdout(contains("cards"));
}

#[test]
fn cards_on_fresh_image() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    cmd()
        .args(["--config", &config_arg(&config), "cards"])
        .assert()
        .success()
        .stdout(contains("0 of 120 cards"));

    assert!(dir.path().join("eeprom.bin").exists());
}

#[test]
fn cards_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    cmd()
        .args(["cards", "--json", "--config", &config_arg(&config)])
        .assert()
        .success()
        .stdout(contains("[]"));
}

#[test]
fn config_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    cmd()
        .env("SMARTLOCK_CONFIG", &config)
        .arg("cards")
        .assert()
        .success()
        .stdout(contains("0 of 120 cards"));
}

#[test]
fn reset_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");

    cmd()
        .args(["--config", &config_arg(&config), "reset"])
        .assert()
        .success();

    cmd()
        .args(["--config", &config_arg(&config), "cards"])
        .assert()
        .success()
        .stdout(contains("0 of 120 cards"));
}

#[test]
fn serial_mode_without_devices_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "\n[devices]\nmode = \"serial\"\n");

    cmd()
        .args(["--config", &config_arg(&config), "cards"])
        .assert()
        .failure()
        .stderr(contains("serial device mode"));
}

#[test]
fn unknown_config_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "\n[admin]\nport = 80\n");

    cmd()
        .args(["--config", &config_arg(&config), "cards"])
        .assert()
        .failure()
        .stderr(contains("invalid configuration"));
}

#[test]
fn bad_listen_address() {
    cmd()
        .args(["--listen", "nowhere", "cards"])
        .assert()
        .failure()
        .stderr(contains("--listen"));
}

#[test]
fn admin_bind_failure_stops_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "");
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    cmd()
        .env("RUST_LOG", "info")
        .args(["--config", &config_arg(&config), "--listen", &addr, "run"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(contains("cannot start admin panel"))
        .stderr(contains("Lock runtime stopped"));
}
