//! End-to-end runs of the lock runtime against mock peripherals and an
//! in-memory access log.

use std::time::Duration;

use smartlock_core::{CardUid, LockTime, PinCode};
use smartlock_engine::{
    AccessController, ControllerConfig, LockRuntime, LockState, RuntimeConfig, SharedController,
};
use smartlock_hardware::devices::{AnyKeypadDevice, AnyRfidDevice, AnyScannerDevice};
use smartlock_hardware::mock::{
    MockKeypad, MockKeypadHandle, MockLockActuator, MockLockActuatorHandle, MockRfid,
    MockRfidHandle, MockScanner, MockScannerHandle,
};
use smartlock_hardware::{AnyLockActuator, PeripheralConfig, PeripheralManager};
use smartlock_storage::{
    AccessLog, AccessLogRepository, Database, LockStore, MemoryEeprom, SqliteAccessLogRepository,
};
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

const MASTER: CardUid = CardUid::new([9, 9, 9, 9]);
const USER: CardUid = CardUid::new([172, 61, 255, 160]);
const STRANGER: CardUid = CardUid::new([1, 2, 3, 4]);

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    controller: SharedController,
    keypad: MockKeypadHandle,
    rfid: MockRfidHandle,
    scanner: MockScannerHandle,
    relay: MockLockActuatorHandle,
    repo: SqliteAccessLogRepository,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<smartlock_engine::Result<()>>,
}

async fn start(unlock_duration: Duration) -> Harness {
    let mut store = LockStore::open(MemoryEeprom::new()).unwrap();
    store
        .complete_first_run(MASTER, &PinCode::new("1234").unwrap())
        .unwrap();
    store.set_lock_time(LockTime::from_minutes(1)).unwrap();
    store.toggle_card(USER).unwrap();

    let config = ControllerConfig {
        message_duration: Duration::from_millis(100),
        master_notice: Duration::from_millis(50),
        enrollment_notice: Duration::from_millis(50),
        saved_notice: Duration::from_millis(50),
        ..ControllerConfig::default()
    };
    let controller = AccessController::new(store, config, std::time::Instant::now()).unwrap();
    let controller = Arc::new(Mutex::new(controller));

    let db = Database::in_memory().await.unwrap();
    let repo = SqliteAccessLogRepository::new(db.pool().clone());

    let (keypad, keypad_handle) = MockKeypad::new();
    let (rfid, rfid_handle) = MockRfid::new();
    let (scanner, scanner_handle) = MockScanner::new();
    let (relay, relay_handle) = MockLockActuator::new();

    let mut manager = PeripheralManager::new(PeripheralConfig {
        rfid_poll_interval: Duration::from_millis(10),
        ..PeripheralConfig::default()
    });
    manager.register_keypad(AnyKeypadDevice::Mock(keypad));
    manager.register_rfid(AnyRfidDevice::Mock(rfid));
    manager.register_scanner(AnyScannerDevice::Mock(scanner));
    let events = manager.start();

    let runtime = LockRuntime::new(
        Arc::clone(&controller),
        AnyLockActuator::Mock(relay),
        RuntimeConfig {
            unlock_duration,
            tick_interval: Duration::from_millis(10),
        },
    )
    .with_access_log(repo.clone());

    let (shutdown, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(runtime.run(events, shutdown_rx));

    Harness {
        controller,
        keypad: keypad_handle,
        rfid: rfid_handle,
        scanner: scanner_handle,
        relay: relay_handle,
        repo,
        shutdown,
        task,
    }
}

impl Harness {
    async fn wait_for_state(&self, state: LockState) {
        tokio::time::timeout(WAIT, async {
            while self.controller.lock().await.state() != state {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("controller never reached {state}"));
    }

    async fn wait_for_logs(&self, count: usize) -> Vec<AccessLog> {
        tokio::time::timeout(WAIT, async {
            loop {
                let logs = self.repo.find_recent(100).await.unwrap();
                if logs.len() >= count {
                    return logs;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("access log entries never appeared")
    }

    async fn stop(self) -> MockLockActuatorHandle {
        self.shutdown.send(()).unwrap();
        tokio::time::timeout(WAIT, self.task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        self.relay
    }
}

#[tokio::test]
async fn test_card_grant_pulses_relay_and_logs() {
    let mut harness = start(Duration::from_millis(100)).await;

    harness.rfid.present(USER).await.unwrap();

    tokio::time::timeout(WAIT, harness.relay.wait_for(true))
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(WAIT, harness.relay.wait_for(false))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(harness.relay.release_count(), 1);

    let logs = harness.wait_for_logs(1).await;
    assert!(logs[0].was_granted());
    assert_eq!(logs[0].credential_kind, "card");
    assert_eq!(logs[0].credential.as_deref(), Some("172:61:255:160"));
    assert_eq!(logs[0].display_message.as_deref(), Some("ACCESS GRANTED"));

    harness.wait_for_state(LockState::Idle).await;
    harness.stop().await;
}

#[tokio::test]
async fn test_pin_entry_grants() {
    let mut harness = start(Duration::from_millis(100)).await;

    harness.keypad.enter_pin("1234").await.unwrap();
    tokio::time::timeout(WAIT, harness.relay.wait_for(true))
        .await
        .unwrap()
        .unwrap();

    let logs = harness.wait_for_logs(1).await;
    assert_eq!(logs[0].credential_kind, "pin");
    assert_eq!(logs[0].credential, None);

    harness.stop().await;
}

#[tokio::test]
async fn test_three_wrong_pins_lock_out() {
    let harness = start(Duration::from_millis(100)).await;

    for _ in 0..2 {
        harness.keypad.enter_pin("9999").await.unwrap();
        harness.wait_for_state(LockState::Denied).await;
        harness.wait_for_state(LockState::Idle).await;
    }
    harness.keypad.enter_pin("9999").await.unwrap();
    harness.wait_for_state(LockState::LockedOut).await;

    // A valid card does nothing while locked out.
    harness.rfid.present(USER).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.relay.release_count(), 0);

    let logs = harness.wait_for_logs(3).await;
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(AccessLog::was_denied));

    {
        let controller = harness.controller.lock().await;
        assert_eq!(controller.display().text(), "LOCKED\n");
        assert_eq!(controller.failed_attempts(), 3);
    }

    harness.stop().await;
}

#[tokio::test]
async fn test_barcode_scan_and_unknown_card() {
    let harness = start(Duration::from_millis(50)).await;

    harness.scanner.scan(USER.to_hex()).await.unwrap();
    harness.wait_for_state(LockState::Granted).await;
    harness.wait_for_state(LockState::Idle).await;

    harness.rfid.present(STRANGER).await.unwrap();
    harness.wait_for_state(LockState::Denied).await;

    let logs = harness.wait_for_logs(2).await;
    let scan = logs.iter().find(|log| log.credential_kind == "barcode").unwrap();
    assert!(scan.was_granted());
    assert_eq!(scan.credential.as_deref(), Some("AC:3D:FF:A0"));

    let card = logs.iter().find(|log| log.credential_kind == "card").unwrap();
    assert!(card.was_denied());
    assert_eq!(card.credential.as_deref(), Some("1:2:3:4"));

    harness.stop().await;
}

#[tokio::test]
async fn test_master_mode_enrolls_card() {
    let harness = start(Duration::from_millis(50)).await;

    harness.rfid.present(MASTER).await.unwrap();
    harness.wait_for_state(LockState::MasterMode).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    harness.rfid.present(STRANGER).await.unwrap();
    tokio::time::timeout(WAIT, async {
        while !harness
            .controller
            .lock()
            .await
            .store()
            .contains_card(&STRANGER)
            .unwrap()
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    // Enrollment is not an access attempt.
    assert!(harness.repo.find_recent(10).await.unwrap().is_empty());
    harness.stop().await;
}

#[tokio::test]
async fn test_shutdown_engages_relay() {
    let mut harness = start(Duration::from_secs(60)).await;

    harness.rfid.present(USER).await.unwrap();
    tokio::time::timeout(WAIT, harness.relay.wait_for(true))
        .await
        .unwrap()
        .unwrap();

    let relay = harness.stop().await;
    assert!(!relay.is_released());
}
