//! Access decision logic.
//!
//! [`AccessController`] owns the [`LockStore`], the [`StateMachine`] and the
//! [`VirtualDisplay`]. It is synchronous and takes the current time as an
//! argument; the async [`LockRuntime`](crate::runtime::LockRuntime) feeds it
//! peripheral input and clock ticks and carries out what the returned
//! [`Outcome`] asks for.
//!
//! Settings (feature switches, PIN, lock time, card table) are read from the
//! store on every decision, so changes made through the admin panel apply
//! to the next credential.

use std::time::{Duration, Instant};

use serde::Serialize;
use smartlock_core::constants::{MAX_FAILED_ATTEMPTS, MESSAGE_DURATION_MS, PIN_CODE_LEN};
use smartlock_core::{CardUid, CredentialKind, Feature, PinCode};
use smartlock_keypad::Key;
use smartlock_storage::{CardToggle, LockStore, StorageError};
use tracing::{debug, info, warn};

use crate::display::VirtualDisplay;
use crate::error::Result;
use crate::messages::DisplayMessages;
use crate::state_machine::{LockState, StateMachine};

/// Input the controller reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    Card(CardUid),
    Barcode(String),
}

/// How long the various screens stay up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// "ACCESS GRANTED", "ACCESS DENIED" and the master ID during setup.
    pub message_duration: Duration,

    /// Entering and leaving master mode.
    pub master_notice: Duration,

    /// "Card added", "Card deleted", "MEMORY FULL".
    pub enrollment_notice: Duration,

    /// "Password saved" at the end of setup.
    pub saved_notice: Duration,

    /// Failed attempts that trigger a lockout.
    pub max_failed_attempts: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            message_duration: Duration::from_millis(MESSAGE_DURATION_MS),
            master_notice: Duration::from_millis(1_000),
            enrollment_notice: Duration::from_millis(1_500),
            saved_notice: Duration::from_millis(1_000),
            max_failed_attempts: MAX_FAILED_ATTEMPTS,
        }
    }
}

/// A credential check and its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessAttempt {
    pub kind: CredentialKind,

    /// Card UID (decimal) or scanned text; `None` for PIN entries.
    pub credential: Option<String>,

    pub granted: bool,

    /// This attempt started a lockout.
    pub locked_out: bool,
}

impl AccessAttempt {
    /// The message shown for this attempt.
    pub fn message(&self) -> &'static str {
        if self.granted {
            DisplayMessages::ACCESS_GRANTED
        } else {
            DisplayMessages::ACCESS_DENIED
        }
    }
}

/// What happened in response to one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Present when a credential was evaluated.
    pub attempt: Option<AccessAttempt>,

    /// Present when master mode enrolled or removed a card.
    pub enrollment: Option<(CardUid, CardToggle)>,

    /// Release the lock.
    pub unlock: bool,

    /// The input had no effect.
    pub ignored: bool,
}

impl Outcome {
    fn ignored() -> Self {
        Self {
            ignored: true,
            ..Self::default()
        }
    }

    fn handled() -> Self {
        Self::default()
    }
}

/// Transitions listed in [`ControllerStatus`].
const STATUS_TRANSITIONS: usize = 5;

/// Controller state for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub state: LockState,
    /// Whole seconds spent in `state` so far.
    pub state_secs: u64,
    pub display: Vec<String>,
    pub failed_attempts: u8,
    pub lockout_remaining_secs: Option<u64>,
    /// Latest state changes, oldest first.
    pub recent_transitions: Vec<RecentTransition>,
}

/// A state change as reported in [`ControllerStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentTransition {
    pub from: LockState,
    pub to: LockState,
    pub secs_ago: u64,
}

/// The lock's decision core.
#[derive(Debug)]
pub struct AccessController {
    store: LockStore,
    machine: StateMachine,
    display: VirtualDisplay,
    config: ControllerConfig,
    entry: String,
    pending_master: Option<CardUid>,
    failed_attempts: u8,
    notice_until: Option<Instant>,
}

impl AccessController {
    /// Start in the setup wizard on first run, otherwise at the prompt.
    pub fn new(store: LockStore, config: ControllerConfig, now: Instant) -> Result<Self> {
        let initial = if store.is_first_run()? {
            LockState::SetupScanMaster
        } else {
            LockState::Idle
        };

        let mut controller = Self {
            store,
            machine: StateMachine::new(initial, now),
            display: VirtualDisplay::default(),
            config,
            entry: String::new(),
            pending_master: None,
            failed_attempts: 0,
            notice_until: None,
        };
        controller.redraw()?;

        info!(state = %initial, "Access controller ready");
        Ok(controller)
    }

    pub fn state(&self) -> LockState {
        self.machine.current_state()
    }

    pub fn display(&self) -> &VirtualDisplay {
        &self.display
    }

    pub fn failed_attempts(&self) -> u8 {
        self.failed_attempts
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Mutable store access for the admin panel.
    pub fn store_mut(&mut self) -> &mut LockStore {
        &mut self.store
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn status(&self, now: Instant) -> ControllerStatus {
        let lockout_remaining_secs = (self.state() == LockState::LockedOut)
            .then(|| self.machine.time_remaining(now))
            .flatten()
            .map(|remaining| remaining.as_secs_f64().ceil() as u64);

        let recent_transitions = self
            .machine
            .last_transitions(STATUS_TRANSITIONS)
            .into_iter()
            .map(|transition| RecentTransition {
                from: transition.from,
                to: transition.to,
                secs_ago: now.saturating_duration_since(transition.at).as_secs(),
            })
            .collect();

        ControllerStatus {
            state: self.state(),
            state_secs: self.machine.time_in_current_state(now).as_secs(),
            display: self
                .display
                .get_all_lines()
                .into_iter()
                .map(|line| line.trim_end().to_string())
                .collect(),
            failed_attempts: self.failed_attempts,
            lockout_remaining_secs,
            recent_transitions,
        }
    }

    /// React to one input.
    ///
    /// Input is ignored while a timed message is on screen and during a
    /// lockout.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or updated.
    pub fn handle(&mut self, input: Input, now: Instant) -> Result<Outcome> {
        self.tick(now)?;

        if self.notice_active(now) || self.state().ignores_input() {
            debug!(state = %self.state(), ?input, "Input ignored");
            return Ok(Outcome::ignored());
        }

        match (self.state(), input) {
            (LockState::SetupScanMaster, Input::Card(uid)) => self.setup_master(uid, now),
            (LockState::SetupEnterPin, Input::Key(key)) => self.setup_pin_key(key, now),
            (LockState::Idle, Input::Card(uid)) => self.idle_card(uid, now),
            (LockState::Idle, Input::Key(key)) => self.idle_key(key, now),
            (LockState::Idle, Input::Barcode(code)) => self.idle_barcode(&code, now),
            (LockState::MasterMode, Input::Card(uid)) => self.master_card(uid, now),
            _ => Ok(Outcome::ignored()),
        }
    }

    /// Advance timers: expire notices, end grant/deny screens and lockouts.
    ///
    /// Returns whether the display changed.
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        let mut changed = false;

        if let Some(until) = self.notice_until
            && now >= until
        {
            self.notice_until = None;
            self.redraw()?;
            changed = true;
        }

        match self.state() {
            LockState::Granted | LockState::Denied if self.machine.deadline_passed(now) => {
                self.enter(LockState::Idle, now)?;
                changed = true;
            }
            LockState::LockedOut if self.machine.deadline_passed(now) => {
                self.failed_attempts = 0;
                self.enter(LockState::Idle, now)?;
                info!("Lockout ended");
                changed = true;
            }
            LockState::MasterMode if !self.store.feature_enabled(Feature::Nfc)? => {
                self.enter(LockState::Idle, now)?;
                info!("NFC disabled, leaving master mode");
                changed = true;
            }
            _ => {}
        }

        Ok(changed)
    }

    fn setup_master(&mut self, uid: CardUid, now: Instant) -> Result<Outcome> {
        self.pending_master = Some(uid);
        self.enter(LockState::SetupEnterPin, now)?;
        self.display
            .show_message(DisplayMessages::MASTER_ID, &uid.to_string())?;
        self.notice_until = Some(now + self.config.message_duration);

        info!(master = %uid, "Master card scanned");
        Ok(Outcome::handled())
    }

    fn setup_pin_key(&mut self, key: Key, now: Instant) -> Result<Outcome> {
        match key {
            Key::Digit(_) => {
                if self.entry.len() < PIN_CODE_LEN {
                    self.entry.push(key.as_char());
                    self.redraw()?;
                }
            }
            Key::Clear => {
                self.entry.pop();
                self.redraw()?;
            }
            Key::Enter => {
                let Ok(pin) = PinCode::new(&self.entry) else {
                    return Ok(Outcome::ignored());
                };
                let Some(master) = self.pending_master.take() else {
                    warn!("PIN entered without a master card, restarting setup");
                    self.machine.reset(LockState::SetupScanMaster, now);
                    self.entry.clear();
                    self.redraw()?;
                    return Ok(Outcome::handled());
                };

                self.store.complete_first_run(master, &pin)?;
                self.enter(LockState::Idle, now)?;
                self.display
                    .show_message(DisplayMessages::PIN_SAVED, pin.as_str())?;
                self.notice_until = Some(now + self.config.saved_notice);
            }
            Key::Function(_) => return Ok(Outcome::ignored()),
        }
        Ok(Outcome::handled())
    }

    fn idle_card(&mut self, uid: CardUid, now: Instant) -> Result<Outcome> {
        if !self.store.feature_enabled(Feature::Nfc)? {
            return Ok(Outcome::ignored());
        }

        if self.store.is_master_card(&uid)? {
            self.enter(LockState::MasterMode, now)?;
            self.notice_until = Some(now + self.config.master_notice);
            info!("Master mode entered");
            return Ok(Outcome::handled());
        }

        let granted = self.store.contains_card(&uid)?;
        self.decide(CredentialKind::Card, Some(uid.to_string()), granted, now)
    }

    fn idle_key(&mut self, key: Key, now: Instant) -> Result<Outcome> {
        if !self.store.feature_enabled(Feature::Pin)? {
            return Ok(Outcome::ignored());
        }

        match key {
            Key::Digit(_) => {
                if self.entry.len() < PIN_CODE_LEN {
                    self.entry.push(key.as_char());
                    self.redraw()?;
                }
                Ok(Outcome::handled())
            }
            Key::Clear => {
                self.entry.pop();
                self.redraw()?;
                Ok(Outcome::handled())
            }
            Key::Enter => {
                let granted = self.store.verify_pin(&self.entry)?;
                self.decide(CredentialKind::Pin, None, granted, now)
            }
            Key::Function(_) => Ok(Outcome::ignored()),
        }
    }

    fn idle_barcode(&mut self, code: &str, now: Instant) -> Result<Outcome> {
        if !self.store.feature_enabled(Feature::Scanner)? {
            return Ok(Outcome::ignored());
        }

        let code = code.trim();
        let granted = match CardUid::parse_hex(code) {
            Ok(uid) => self.store.contains_card(&uid)?,
            Err(e) => {
                debug!(error = %e, "Unreadable barcode");
                false
            }
        };
        self.decide(CredentialKind::Barcode, Some(code.to_string()), granted, now)
    }

    fn master_card(&mut self, uid: CardUid, now: Instant) -> Result<Outcome> {
        if !self.store.feature_enabled(Feature::Nfc)? {
            return Ok(Outcome::ignored());
        }

        if self.store.is_master_card(&uid)? {
            self.enter(LockState::Idle, now)?;
            self.display.show_message(DisplayMessages::EXITING, "")?;
            self.notice_until = Some(now + self.config.master_notice);
            info!("Master mode left");
            return Ok(Outcome::handled());
        }

        let (message, enrollment) = match self.store.toggle_card(uid) {
            Ok(CardToggle::Added) => (DisplayMessages::CARD_ADDED, Some((uid, CardToggle::Added))),
            Ok(CardToggle::Removed) => (
                DisplayMessages::CARD_DELETED,
                Some((uid, CardToggle::Removed)),
            ),
            Err(StorageError::CardTableFull { .. }) => (DisplayMessages::MEMORY_FULL, None),
            Err(e) => return Err(e.into()),
        };

        self.display.show_message(message, "")?;
        self.notice_until = Some(now + self.config.enrollment_notice);

        Ok(Outcome {
            enrollment,
            ..Outcome::handled()
        })
    }

    fn decide(
        &mut self,
        kind: CredentialKind,
        credential: Option<String>,
        granted: bool,
        now: Instant,
    ) -> Result<Outcome> {
        let mut attempt = AccessAttempt {
            kind,
            credential,
            granted,
            locked_out: false,
        };

        if granted {
            self.failed_attempts = 0;
            self.enter(LockState::Granted, now)?;
            self.machine.set_deadline(now + self.config.message_duration);
            info!(kind = %kind, "Access granted");

            return Ok(Outcome {
                attempt: Some(attempt),
                unlock: true,
                ..Outcome::handled()
            });
        }

        self.failed_attempts = self.failed_attempts.saturating_add(1);
        self.enter(LockState::Denied, now)?;
        warn!(kind = %kind, tries = self.failed_attempts, "Access denied");

        if self.failed_attempts >= self.config.max_failed_attempts {
            let lock_time = self.store.lock_time()?;
            self.enter(LockState::LockedOut, now)?;
            self.machine.set_deadline(now + lock_time.duration());
            attempt.locked_out = true;
            warn!(minutes = lock_time.minutes(), "Too many failed attempts, locked");
        } else {
            self.machine.set_deadline(now + self.config.message_duration);
        }

        Ok(Outcome {
            attempt: Some(attempt),
            ..Outcome::handled()
        })
    }

    fn enter(&mut self, state: LockState, now: Instant) -> Result<()> {
        self.machine.transition_to(state, now)?;
        self.entry.clear();
        self.notice_until = None;
        self.redraw()
    }

    fn notice_active(&self, now: Instant) -> bool {
        self.notice_until.is_some_and(|until| now < until)
    }

    fn redraw(&mut self) -> Result<()> {
        let masked;
        let (line1, line2) = match self.state() {
            LockState::SetupScanMaster => (DisplayMessages::SCAN_MASTER, ""),
            LockState::SetupEnterPin => (DisplayMessages::ENTER_PIN, self.entry.as_str()),
            LockState::Idle => {
                masked = DisplayMessages::PIN_MASK
                    .to_string()
                    .repeat(self.entry.len());
                (DisplayMessages::PROMPT, masked.as_str())
            }
            LockState::MasterMode => (
                DisplayMessages::MASTER_MODE,
                DisplayMessages::MASTER_MODE_HINT,
            ),
            LockState::Granted => (DisplayMessages::ACCESS_GRANTED, ""),
            LockState::Denied => (DisplayMessages::ACCESS_DENIED, ""),
            LockState::LockedOut => (DisplayMessages::LOCKED, ""),
        };
        self.display.show_message(line1, line2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartlock_core::LockTime;
    use smartlock_storage::MemoryEeprom;

    const MASTER: CardUid = CardUid::new([9, 9, 9, 9]);
    const USER: CardUid = CardUid::new([172, 61, 255, 160]);
    const STRANGER: CardUid = CardUid::new([1, 2, 3, 4]);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn line(controller: &AccessController, n: usize) -> String {
        controller.display().get_line(n).unwrap().trim_end().to_string()
    }

    /// Controller past setup with one enrolled user card and PIN 1234.
    fn ready(now: Instant) -> AccessController {
        let mut store = LockStore::open(MemoryEeprom::new()).unwrap();
        store
            .complete_first_run(MASTER, &PinCode::new("1234").unwrap())
            .unwrap();
        store.toggle_card(USER).unwrap();
        AccessController::new(store, ControllerConfig::default(), now).unwrap()
    }

    fn type_keys(controller: &mut AccessController, keys: &str, now: Instant) -> Outcome {
        let mut last = Outcome::default();
        for c in keys.chars() {
            last = controller
                .handle(Input::Key(Key::from_char(c).unwrap()), now)
                .unwrap();
        }
        last
    }

    #[test]
    fn test_first_run_wizard() {
        let now = Instant::now();
        let store = LockStore::open(MemoryEeprom::new()).unwrap();
        let mut controller = AccessController::new(store, ControllerConfig::default(), now).unwrap();

        assert_eq!(controller.state(), LockState::SetupScanMaster);
        assert_eq!(line(&controller, 0), "Scan master card");

        // Keys do nothing before the master card.
        assert!(type_keys(&mut controller, "1", now).ignored);

        controller.handle(Input::Card(MASTER), now).unwrap();
        assert_eq!(controller.state(), LockState::SetupEnterPin);
        assert_eq!(line(&controller, 0), "Master ID:");
        assert_eq!(line(&controller, 1), "9:9:9:9");

        // Master ID stays up for the message duration.
        assert!(type_keys(&mut controller, "5", now + secs(1)).ignored);

        let later = now + secs(3);
        controller.tick(later).unwrap();
        assert_eq!(line(&controller, 0), "Enter PIN:");

        type_keys(&mut controller, "5679C8", later);
        assert_eq!(line(&controller, 1), "5678");

        type_keys(&mut controller, "O", later);
        assert_eq!(controller.state(), LockState::Idle);
        assert_eq!(line(&controller, 0), "Password saved");
        assert_eq!(line(&controller, 1), "5678");

        controller.tick(later + secs(1)).unwrap();
        assert_eq!(line(&controller, 0), "ENTER PASS:");

        let store = controller.store();
        assert!(!store.is_first_run().unwrap());
        assert!(store.is_master_card(&MASTER).unwrap());
        assert!(store.verify_pin("5678").unwrap());
    }

    #[test]
    fn test_setup_rejects_empty_pin() {
        let now = Instant::now();
        let store = LockStore::open(MemoryEeprom::new()).unwrap();
        let mut controller = AccessController::new(store, ControllerConfig::default(), now).unwrap();
        controller.handle(Input::Card(MASTER), now).unwrap();

        let later = now + secs(3);
        assert!(type_keys(&mut controller, "O", later).ignored);
        assert_eq!(controller.state(), LockState::SetupEnterPin);
    }

    #[test]
    fn test_setup_pin_limited_to_eight_digits() {
        let now = Instant::now();
        let store = LockStore::open(MemoryEeprom::new()).unwrap();
        let mut controller = AccessController::new(store, ControllerConfig::default(), now).unwrap();
        controller.handle(Input::Card(MASTER), now).unwrap();

        let later = now + secs(3);
        type_keys(&mut controller, "1234567890", later);
        assert_eq!(line(&controller, 1), "12345678");
    }

    #[test]
    fn test_user_card_granted() {
        let now = Instant::now();
        let mut controller = ready(now);
        assert_eq!(line(&controller, 0), "ENTER PASS:");

        let outcome = controller.handle(Input::Card(USER), now).unwrap();
        assert!(outcome.unlock);
        let attempt = outcome.attempt.unwrap();
        assert!(attempt.granted);
        assert_eq!(attempt.kind, CredentialKind::Card);
        assert_eq!(attempt.credential.as_deref(), Some("172:61:255:160"));
        assert_eq!(controller.state(), LockState::Granted);
        assert_eq!(line(&controller, 0), "ACCESS GRANTED");

        // Input ignored while the message is shown.
        assert!(controller.handle(Input::Card(USER), now + secs(1)).unwrap().ignored);

        controller.tick(now + secs(3)).unwrap();
        assert_eq!(controller.state(), LockState::Idle);
        assert_eq!(line(&controller, 0), "ENTER PASS:");
    }

    #[test]
    fn test_unknown_card_denied() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = controller.handle(Input::Card(STRANGER), now).unwrap();
        assert!(!outcome.unlock);
        assert!(!outcome.attempt.unwrap().granted);
        assert_eq!(controller.failed_attempts(), 1);
        assert_eq!(line(&controller, 0), "ACCESS DENIED");
    }

    #[test]
    fn test_pin_entry_masked_and_verified() {
        let now = Instant::now();
        let mut controller = ready(now);

        type_keys(&mut controller, "129C3", now);
        assert_eq!(line(&controller, 1), "XXX");

        let outcome = type_keys(&mut controller, "4O", now);
        assert!(outcome.unlock);
        assert_eq!(outcome.attempt.unwrap().kind, CredentialKind::Pin);
    }

    #[test]
    fn test_empty_pin_denied() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = type_keys(&mut controller, "O", now);
        let attempt = outcome.attempt.unwrap();
        assert!(!attempt.granted);
        assert_eq!(attempt.credential, None);
    }

    #[test]
    fn test_function_keys_ignored() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = controller
            .handle(Input::Key(Key::Function('F')), now)
            .unwrap();
        assert!(outcome.ignored);
        assert_eq!(controller.state(), LockState::Idle);
    }

    #[test]
    fn test_barcode_matches_enrolled_card() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = controller
            .handle(Input::Barcode("AC:3D:FF:A0".to_string()), now)
            .unwrap();
        assert!(outcome.unlock);
        let attempt = outcome.attempt.unwrap();
        assert_eq!(attempt.kind, CredentialKind::Barcode);
        assert_eq!(attempt.credential.as_deref(), Some("AC:3D:FF:A0"));
    }

    #[test]
    fn test_bad_barcode_counts_as_failure() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = controller
            .handle(Input::Barcode("not-a-uid".to_string()), now)
            .unwrap();
        assert!(!outcome.attempt.unwrap().granted);
        assert_eq!(controller.failed_attempts(), 1);
    }

    #[test]
    fn test_master_barcode_is_not_a_user_card() {
        let now = Instant::now();
        let mut controller = ready(now);

        let outcome = controller
            .handle(Input::Barcode(MASTER.to_hex()), now)
            .unwrap();
        assert!(!outcome.unlock);
    }

    #[test]
    fn test_three_failures_lock_out() {
        let now = Instant::now();
        let mut controller = ready(now);
        controller
            .store_mut()
            .set_lock_time(LockTime::from_minutes(1))
            .unwrap();

        let mut t = now;
        for _ in 0..2 {
            controller.handle(Input::Card(STRANGER), t).unwrap();
            t += secs(3);
            controller.tick(t).unwrap();
            assert_eq!(controller.state(), LockState::Idle);
        }

        let outcome = controller.handle(Input::Card(STRANGER), t).unwrap();
        assert!(outcome.attempt.unwrap().locked_out);
        assert_eq!(controller.state(), LockState::LockedOut);
        assert_eq!(line(&controller, 0), "LOCKED");
        assert_eq!(controller.status(t).lockout_remaining_secs, Some(60));

        // Even a valid card is ignored during the lockout.
        assert!(controller.handle(Input::Card(USER), t + secs(59)).unwrap().ignored);

        controller.tick(t + secs(60)).unwrap();
        assert_eq!(controller.state(), LockState::Idle);
        assert_eq!(controller.failed_attempts(), 0);
        assert_eq!(line(&controller, 0), "ENTER PASS:");
    }

    #[test]
    fn test_grant_resets_failed_attempts() {
        let now = Instant::now();
        let mut controller = ready(now);

        controller.handle(Input::Card(STRANGER), now).unwrap();
        controller.tick(now + secs(3)).unwrap();
        controller.handle(Input::Card(USER), now + secs(3)).unwrap();
        assert_eq!(controller.failed_attempts(), 0);
    }

    #[test]
    fn test_zero_lock_time_ends_on_next_tick() {
        let now = Instant::now();
        let mut controller = ready(now);
        controller
            .store_mut()
            .set_lock_time(LockTime::from_minutes(0))
            .unwrap();

        let mut t = now;
        for _ in 0..3 {
            controller.tick(t).unwrap();
            controller.handle(Input::Card(STRANGER), t).unwrap();
            t += secs(3);
        }
        controller.tick(t).unwrap();
        assert_eq!(controller.state(), LockState::Idle);
    }

    #[test]
    fn test_master_mode_enrolls_and_removes() {
        let now = Instant::now();
        let mut controller = ready(now);

        controller.handle(Input::Card(MASTER), now).unwrap();
        assert_eq!(controller.state(), LockState::MasterMode);
        assert_eq!(line(&controller, 0), "Scan card to");
        assert_eq!(line(&controller, 1), "add or delete");

        let t = now + secs(1);
        let outcome = controller.handle(Input::Card(STRANGER), t).unwrap();
        assert_eq!(outcome.enrollment, Some((STRANGER, CardToggle::Added)));
        assert_eq!(line(&controller, 0), "Card added");
        assert!(controller.store().contains_card(&STRANGER).unwrap());

        let t = t + Duration::from_millis(1_500);
        controller.tick(t).unwrap();
        assert_eq!(line(&controller, 0), "Scan card to");

        let outcome = controller.handle(Input::Card(STRANGER), t).unwrap();
        assert_eq!(outcome.enrollment, Some((STRANGER, CardToggle::Removed)));
        assert_eq!(line(&controller, 0), "Card deleted");

        let t = t + Duration::from_millis(1_500);
        controller.handle(Input::Card(MASTER), t).unwrap();
        assert_eq!(controller.state(), LockState::Idle);
        assert_eq!(line(&controller, 0), "EXITING....");

        controller.tick(t + secs(1)).unwrap();
        assert_eq!(line(&controller, 0), "ENTER PASS:");
    }

    #[test]
    fn test_master_mode_ignores_keys_and_barcodes() {
        let now = Instant::now();
        let mut controller = ready(now);
        controller.handle(Input::Card(MASTER), now).unwrap();

        let t = now + secs(1);
        assert!(type_keys(&mut controller, "1234O", t).ignored);
        assert!(controller
            .handle(Input::Barcode(USER.to_hex()), t)
            .unwrap()
            .ignored);
        assert_eq!(controller.state(), LockState::MasterMode);
    }

    #[test]
    fn test_master_mode_memory_full() {
        let now = Instant::now();
        let mut controller = ready(now);
        for n in 1..120u8 {
            controller
                .store_mut()
                .toggle_card(CardUid::new([7, 7, 7, n]))
                .unwrap();
        }

        controller.handle(Input::Card(MASTER), now).unwrap();
        let outcome = controller
            .handle(Input::Card(STRANGER), now + secs(1))
            .unwrap();
        assert_eq!(outcome.enrollment, None);
        assert_eq!(line(&controller, 0), "MEMORY FULL");
    }

    #[test]
    fn test_disabled_features_ignore_input() {
        let now = Instant::now();
        let mut controller = ready(now);
        for feature in Feature::ALL {
            controller.store_mut().set_feature(feature, false).unwrap();
        }

        assert!(controller.handle(Input::Card(USER), now).unwrap().ignored);
        assert!(type_keys(&mut controller, "1234O", now).ignored);
        assert!(controller
            .handle(Input::Barcode(USER.to_hex()), now)
            .unwrap()
            .ignored);
        assert_eq!(controller.failed_attempts(), 0);
    }

    #[test]
    fn test_disabling_nfc_leaves_master_mode() {
        let now = Instant::now();
        let mut controller = ready(now);
        controller.handle(Input::Card(MASTER), now).unwrap();

        controller
            .store_mut()
            .set_feature(Feature::Nfc, false)
            .unwrap();
        assert!(controller.tick(now + secs(1)).unwrap());
        assert_eq!(controller.state(), LockState::Idle);
    }

    #[test]
    fn test_status_snapshot() {
        let now = Instant::now();
        let mut controller = ready(now);
        type_keys(&mut controller, "12", now);

        let status = controller.status(now);
        assert_eq!(status.state, LockState::Idle);
        assert_eq!(status.display, vec!["ENTER PASS:".to_string(), "XX".to_string()]);
        assert_eq!(status.lockout_remaining_secs, None);
    }

    #[test]
    fn test_status_reports_recent_transitions() {
        let now = Instant::now();
        let mut controller = ready(now);
        type_keys(&mut controller, "9999O", now);

        let later = now + Duration::from_secs(2);
        let status = controller.status(later);
        assert_eq!(status.state, LockState::Denied);
        assert_eq!(status.state_secs, 2);

        let last = status.recent_transitions.last().unwrap();
        assert_eq!(last.from, LockState::Idle);
        assert_eq!(last.to, LockState::Denied);
        assert_eq!(last.secs_ago, 2);
        assert!(status.recent_transitions.len() <= STATUS_TRANSITIONS);
    }
}
