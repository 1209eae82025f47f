//! Event loop tying peripherals, the controller and the lock relay together.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use smartlock_core::constants::UNLOCK_DURATION_MS;
use smartlock_hardware::{AnyLockActuator, LockActuator, PeripheralEvent, PeripheralHandle};
use smartlock_storage::{AccessLog, AccessLogRepository, SqliteAccessLogRepository};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::controller::{AccessAttempt, AccessController, Input, Outcome};
use crate::error::Result;

/// Controller shared between the runtime and the admin panel.
pub type SharedController = Arc<Mutex<AccessController>>;

/// Timing for the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How long the relay stays released after a grant.
    pub unlock_duration: Duration,

    /// How often timers are checked when no input arrives.
    pub tick_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            unlock_duration: Duration::from_millis(UNLOCK_DURATION_MS),
            tick_interval: Duration::from_millis(100),
        }
    }
}

/// Drives an [`AccessController`] from peripheral events.
#[derive(Debug)]
pub struct LockRuntime {
    controller: SharedController,
    actuator: Arc<Mutex<AnyLockActuator>>,
    access_log: Option<SqliteAccessLogRepository>,
    config: RuntimeConfig,
    pulse: Option<JoinHandle<()>>,
}

impl LockRuntime {
    pub fn new(controller: SharedController, actuator: AnyLockActuator, config: RuntimeConfig) -> Self {
        Self {
            controller,
            actuator: Arc::new(Mutex::new(actuator)),
            access_log: None,
            config,
            pulse: None,
        }
    }

    /// Record every credential check in the access log.
    pub fn with_access_log(mut self, repository: SqliteAccessLogRepository) -> Self {
        self.access_log = Some(repository);
        self
    }

    pub fn controller(&self) -> SharedController {
        Arc::clone(&self.controller)
    }

    /// Run until `shutdown` fires or its sender is dropped.
    ///
    /// The relay is engaged and the peripheral tasks are stopped before
    /// returning.
    ///
    /// # Errors
    /// Returns an error if the controller's store fails.
    pub async fn run(
        mut self,
        mut events: PeripheralHandle,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        info!("Lock runtime started");

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }

                event = events.recv(), if inputs_open => match event {
                    Some(event) => {
                        if let Err(e) = self.on_event(event).await {
                            break Err(e);
                        }
                    }
                    None => {
                        warn!("All peripheral tasks stopped");
                        inputs_open = false;
                    }
                },

                _ = ticker.tick() => {
                    let now = Instant::now().into_std();
                    if let Err(e) = self.controller.lock().await.tick(now) {
                        break Err(e);
                    }
                }
            }
        };

        if let Some(pulse) = self.pulse.take() {
            pulse.abort();
        }
        if let Err(e) = self.actuator.lock().await.engage().await {
            error!(error = %e, "Failed to engage lock on shutdown");
        }
        if let Err(e) = events.shutdown().await {
            warn!(error = %e, "Peripheral shutdown reported errors");
        }

        info!("Lock runtime stopped");
        result
    }

    async fn on_event(&mut self, event: PeripheralEvent) -> Result<()> {
        let input = match event {
            PeripheralEvent::KeyPressed(key) => Input::Key(key),
            PeripheralEvent::CardRead(card) => Input::Card(card.uid),
            PeripheralEvent::BarcodeScanned(code) => Input::Barcode(code),
            PeripheralEvent::DeviceError {
                device_type,
                error,
                fatal,
            } => {
                if fatal {
                    error!(%device_type, %error, "Device stopped");
                } else {
                    warn!(%device_type, %error, "Device error");
                }
                return Ok(());
            }
            other => {
                debug!(?other, "Ignoring peripheral event");
                return Ok(());
            }
        };

        let now = Instant::now().into_std();
        let outcome = self.controller.lock().await.handle(input, now)?;
        self.apply(outcome).await;
        Ok(())
    }

    async fn apply(&mut self, outcome: Outcome) {
        if outcome.unlock {
            self.pulse_relay();
        }

        if let Some((uid, change)) = outcome.enrollment {
            info!(card = %uid, ?change, "Card table updated");
        }

        if let Some(attempt) = outcome.attempt {
            self.record(&attempt).await;
        }
    }

    /// Release the relay for `unlock_duration`, restarting the timer if a
    /// pulse is already running.
    fn pulse_relay(&mut self) {
        if let Some(previous) = self.pulse.take() {
            previous.abort();
        }

        let actuator = Arc::clone(&self.actuator);
        let duration = self.config.unlock_duration;

        self.pulse = Some(tokio::spawn(async move {
            if let Err(e) = actuator.lock().await.release().await {
                error!(error = %e, "Failed to release lock");
                return;
            }
            tokio::time::sleep(duration).await;
            if let Err(e) = actuator.lock().await.engage().await {
                error!(error = %e, "Failed to engage lock");
            }
        }));
    }

    async fn record(&self, attempt: &AccessAttempt) {
        let Some(repository) = &self.access_log else {
            return;
        };

        let log = AccessLog::new(
            attempt.kind,
            attempt.credential.clone(),
            attempt.granted,
            attempt.message(),
            Utc::now(),
        );

        if let Err(e) = repository.create(&log).await {
            warn!(error = %e, "Failed to write access log");
        }
    }
}
