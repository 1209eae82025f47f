//! Mock lock relay for testing and development.

use crate::{HardwareError, Result, traits::LockActuator, types::DeviceInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::watch;

/// Mock relay whose state can be observed through a [`MockLockActuatorHandle`].
///
/// # Examples
///
/// ```
/// use smartlock_hardware::mock::MockLockActuator;
/// use smartlock_hardware::traits::LockActuator;
///
/// #[tokio::main]
/// async fn main() -> smartlock_hardware::Result<()> {
///     let (mut relay, handle) = MockLockActuator::new();
///
///     relay.release().await?;
///     assert!(handle.is_released());
///
///     relay.engage().await?;
///     assert!(!handle.is_released());
///     assert_eq!(handle.release_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockLockActuator {
    state_tx: watch::Sender<bool>,
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    releases: AtomicU32,
    failing: AtomicBool,
}

impl MockLockActuator {
    /// Create an engaged (locked) mock relay.
    pub fn new() -> (Self, MockLockActuatorHandle) {
        let (state_tx, state_rx) = watch::channel(false);
        let shared = Arc::new(Shared::default());

        (
            Self {
                state_tx,
                shared: Arc::clone(&shared),
            },
            MockLockActuatorHandle { state_rx, shared },
        )
    }

    fn switch(&self, released: bool) -> Result<()> {
        if self.shared.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::relay("relay did not switch"));
        }
        if released {
            self.shared.releases.fetch_add(1, Ordering::SeqCst);
        }
        self.state_tx.send_replace(released);
        Ok(())
    }
}

impl LockActuator for MockLockActuator {
    async fn release(&mut self) -> Result<()> {
        self.switch(true)
    }

    async fn engage(&mut self) -> Result<()> {
        self.switch(false)
    }

    fn is_released(&self) -> bool {
        *self.state_tx.borrow()
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new("Mock Relay", "Mock Lock Relay"))
    }
}

/// Observer for a mock relay. Cloneable.
#[derive(Debug, Clone)]
pub struct MockLockActuatorHandle {
    state_rx: watch::Receiver<bool>,
    shared: Arc<Shared>,
}

impl MockLockActuatorHandle {
    /// Current relay state.
    pub fn is_released(&self) -> bool {
        *self.state_rx.borrow()
    }

    /// Number of times the relay has been released.
    pub fn release_count(&self) -> u32 {
        self.shared.releases.load(Ordering::SeqCst)
    }

    /// Make subsequent switch attempts fail.
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }

    /// Wait until the relay reaches the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator has been dropped first.
    pub async fn wait_for(&mut self, released: bool) -> Result<()> {
        self.state_rx
            .wait_for(|state| *state == released)
            .await
            .map(|_| ())
            .map_err(|_| HardwareError::disconnected("Mock relay dropped"))
    }
}
