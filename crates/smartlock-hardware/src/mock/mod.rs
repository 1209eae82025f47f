//! Mock device implementations for testing and development.
//!
//! Each mock comes with a handle that drives it from a test or from the
//! daemon's `mock` device mode.

pub mod actuator;
pub mod keypad;
pub mod rfid;
pub mod scanner;

pub use actuator::{MockLockActuator, MockLockActuatorHandle};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use rfid::{MockRfid, MockRfidHandle};
pub use scanner::{MockScanner, MockScannerHandle};
