//! Lock state machine.
//!
//! # States
//!
//! - `SetupScanMaster`: first run, waiting for the master card
//! - `SetupEnterPin`: first run, entering the shared PIN
//! - `Idle`: showing "ENTER PASS:", accepting credentials
//! - `MasterMode`: master card presented, enrolling or removing cards
//! - `Granted`: access granted, relay released
//! - `Denied`: access denied, message shown
//! - `LockedOut`: too many failed attempts, waiting out the lock time
//!
//! # Valid Transitions
//!
//! - SetupScanMaster → SetupEnterPin → Idle
//! - Idle → MasterMode → Idle
//! - Idle → Granted → Idle
//! - Idle → Denied → Idle | LockedOut
//! - LockedOut → Idle
//!
//! [`StateMachine::reset`] forces any state back to `Idle` or the setup
//! wizard, e.g. after a factory reset.
//!
//! Time is passed in by the caller, which keeps the machine deterministic
//! under test.
//!
//! # Examples
//!
//! ```
//! use smartlock_engine::{LockState, StateMachine};
//! use std::time::{Duration, Instant};
//!
//! let now = Instant::now();
//! let mut machine = StateMachine::new(LockState::Idle, now);
//!
//! machine.transition_to(LockState::Denied, now).unwrap();
//! machine.set_deadline(now + Duration::from_secs(3));
//! assert!(!machine.deadline_passed(now));
//! assert!(machine.deadline_passed(now + Duration::from_secs(3)));
//!
//! assert!(machine.transition_to(LockState::MasterMode, now).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Every state the lock can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// First run, waiting for the master card.
    SetupScanMaster,

    /// First run, entering the shared PIN.
    SetupEnterPin,

    /// Waiting for a credential.
    Idle,

    /// Enrolling or removing user cards.
    MasterMode,

    /// Access granted, lock released.
    Granted,

    /// Access denied.
    Denied,

    /// Too many failed attempts; input ignored until the lock time passes.
    LockedOut,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LockState::SetupScanMaster => "SetupScanMaster",
            LockState::SetupEnterPin => "SetupEnterPin",
            LockState::Idle => "Idle",
            LockState::MasterMode => "MasterMode",
            LockState::Granted => "Granted",
            LockState::Denied => "Denied",
            LockState::LockedOut => "LockedOut",
        };
        write!(f, "{}", state_str)
    }
}

impl LockState {
    /// Check if transition to target state is valid from this state.
    ///
    /// ```
    /// use smartlock_engine::LockState;
    ///
    /// assert!(LockState::Idle.can_transition_to(&LockState::Granted));
    /// assert!(!LockState::Granted.can_transition_to(&LockState::Denied));
    /// ```
    pub fn can_transition_to(&self, target: &LockState) -> bool {
        matches!(
            (self, target),
            (LockState::SetupScanMaster, LockState::SetupEnterPin)
                | (LockState::SetupEnterPin, LockState::Idle)
                | (
                    LockState::Idle,
                    LockState::MasterMode | LockState::Granted | LockState::Denied
                )
                | (LockState::MasterMode, LockState::Idle)
                | (LockState::Granted, LockState::Idle)
                | (LockState::Denied, LockState::Idle | LockState::LockedOut)
                | (LockState::LockedOut, LockState::Idle)
        )
    }

    /// Whether credentials are ignored in this state.
    pub fn ignores_input(&self) -> bool {
        matches!(
            self,
            LockState::Granted | LockState::Denied | LockState::LockedOut
        )
    }

    /// Whether the first-run wizard is active.
    pub fn is_setup(&self) -> bool {
        matches!(self, LockState::SetupScanMaster | LockState::SetupEnterPin)
    }
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: LockState,
    pub to: LockState,
    pub at: Instant,
}

impl StateTransition {
    pub fn new(from: LockState, to: LockState, at: Instant) -> Self {
        Self { from, to, at }
    }
}

/// Validated lock state with a bounded transition history and an optional
/// deadline for timed states.
///
/// Not thread-safe; share it behind a `tokio::sync::Mutex`.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: LockState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
    deadline: Option<Instant>,
}

impl StateMachine {
    pub fn new(initial: LockState, now: Instant) -> Self {
        Self {
            current_state: initial,
            state_entered_at: now,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            deadline: None,
        }
    }

    pub fn current_state(&self) -> LockState {
        self.current_state
    }

    pub fn time_in_current_state(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.state_entered_at)
    }

    /// Set the instant at which the current state should end.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a deadline is set and `now` has reached it.
    pub fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left before the deadline, if one is set and not yet reached.
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .and_then(|deadline| deadline.checked_duration_since(now))
            .filter(|remaining| !remaining.is_zero())
    }

    /// Transitions ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Up to `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state`, clearing any deadline.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidStateTransition` if the move is not
    /// allowed from the current state; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: LockState, now: Instant) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(EngineError::InvalidStateTransition {
                from: self.current_state,
                to: new_state,
            });
        }

        let transition = StateTransition::new(self.current_state, new_state, now);
        self.perform_state_change(transition.clone());
        Ok(transition)
    }

    /// Force the machine into `state` regardless of the current one.
    pub fn reset(&mut self, state: LockState, now: Instant) -> StateTransition {
        let transition = StateTransition::new(self.current_state, state, now);
        self.perform_state_change(transition.clone());
        transition
    }

    fn perform_state_change(&mut self, transition: StateTransition) {
        self.current_state = transition.to;
        self.state_entered_at = transition.at;
        self.deadline = None;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}
