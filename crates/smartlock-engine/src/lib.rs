//! Access control engine for the smart lock.
//!
//! This crate holds the lock's behaviour: the state machine, the access
//! decisions made by [`AccessController`], the 16x2 display model and the
//! [`LockRuntime`] event loop that feeds peripheral input to the controller
//! and pulses the relay.

pub mod controller;
pub mod display;
pub mod error;
pub mod messages;
pub mod runtime;
pub mod state_machine;

pub use controller::{
    AccessAttempt, AccessController, ControllerConfig, ControllerStatus, Input, Outcome,
    RecentTransition,
};
pub use display::{Alignment, VirtualDisplay, align_text, truncate_text};
pub use error::{EngineError, Result};
pub use messages::DisplayMessages;
pub use runtime::{LockRuntime, RuntimeConfig, SharedController};
pub use state_machine::{LockState, StateMachine, StateTransition};
