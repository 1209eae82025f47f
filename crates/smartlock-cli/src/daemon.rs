use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use smartlock_core::CardUid;
use smartlock_engine::{AccessController, ControllerConfig, LockRuntime, RuntimeConfig};
use smartlock_network::{AdminServer, AdminServerConfig, AdminState};
use smartlock_storage::{
    Database, DatabaseConfig, FileEeprom, LockStore, SqliteAccessLogRepository,
};
use tokio::sync::{Mutex, oneshot};
use tracing::{info, warn};

use crate::config::{Config, StorageConfig};
use crate::devices;

pub fn open_store(storage: &StorageConfig) -> Result<LockStore> {
    let eeprom = FileEeprom::open(&storage.eeprom_path)
        .with_context(|| format!("cannot open EEPROM image {}", storage.eeprom_path.display()))?;
    LockStore::open(eeprom).context("cannot load lock settings")
}

/// Restore factory settings.
pub fn factory_reset(storage: &StorageConfig) -> Result<()> {
    let mut store = open_store(storage)?;
    store.factory_reset().context("factory reset failed")?;
    warn!(path = %storage.eeprom_path.display(), "Factory reset performed");
    Ok(())
}

#[derive(Debug, Serialize)]
struct CardEntry {
    index: usize,
    uid: String,
    hex: String,
}

/// Print the card table.
pub fn print_cards(storage: &StorageConfig, json: bool) -> Result<()> {
    let store = open_store(storage)?;
    let cards = store.cards()?;

    if json {
        let entries: Vec<CardEntry> = cards
            .iter()
            .enumerate()
            .map(|(index, uid)| CardEntry {
                index,
                uid: uid.to_string(),
                hex: uid.to_hex(),
            })
            .collect();
        let text = serde_json::to_string_pretty(&entries)?;
        println!("{text}");
        return Ok(());
    }

    println!("{}", render_cards(&cards, store.capacity()));
    Ok(())
}

fn render_cards(cards: &[CardUid], capacity: usize) -> String {
    let mut out = format!("{} of {} cards", cards.len(), capacity);
    for (index, uid) in cards.iter().enumerate() {
        out.push_str(&format!("\n{index:>3}: {uid}"));
    }
    out
}

/// Run the lock until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let store = open_store(&config.storage)?;
    if store.is_first_run()? {
        info!("First run: scan the master card to start setup");
    }

    let access_log = match &config.storage.database_path {
        Some(path) => {
            let db = Database::new(DatabaseConfig::new(path.as_path()))
                .await
                .with_context(|| format!("cannot open access log {}", path.display()))?;
            Some(db)
        }
        None => {
            info!("Access log disabled");
            None
        }
    };
    let repository = access_log
        .as_ref()
        .map(|db| SqliteAccessLogRepository::new(db.pool().clone()));

    let controller_config = ControllerConfig {
        message_duration: config.timing.message_duration(),
        ..ControllerConfig::default()
    };
    let controller = AccessController::new(store, controller_config, Instant::now())?;
    let controller = Arc::new(Mutex::new(controller));

    let peripherals = devices::build(&config.devices).await?;
    let events = peripherals.manager.start();

    let mut runtime = LockRuntime::new(
        Arc::clone(&controller),
        peripherals.actuator,
        RuntimeConfig {
            unlock_duration: config.timing.unlock_duration(),
            tick_interval: config.timing.tick_interval(),
        },
    );
    if let Some(repository) = &repository {
        runtime = runtime.with_access_log(repository.clone());
    }

    let (runtime_stop, runtime_stop_rx) = oneshot::channel();
    let mut runtime_task = tokio::spawn(runtime.run(events, runtime_stop_rx));

    if let Some(console) = peripherals.console {
        tokio::spawn(console.run());
    }

    let admin = if config.admin.enabled {
        let mut state = AdminState::new(Arc::clone(&controller));
        if let Some(repository) = repository {
            state = state.with_access_log(repository);
        }
        let spawned = AdminServer::spawn(
            AdminServerConfig {
                bind_addr: config.admin.listen,
            },
            Arc::new(state),
        )
        .await;
        match spawned {
            Ok(server) => Some(server),
            Err(e) => {
                let _ = runtime_stop.send(());
                match runtime_task.await {
                    Ok(Ok(())) => {}
                    Ok(Err(stopped)) => warn!(error = %stopped, "Lock runtime failed"),
                    Err(join) => warn!(error = %join, "Lock runtime panicked"),
                }
                return Err(e).with_context(|| {
                    format!("cannot start admin panel on {}", config.admin.listen)
                });
            }
        }
    } else {
        info!("Admin panel disabled");
        None
    };

    info!("Lock running; press Ctrl-C to stop");
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for Ctrl-C")?;
            info!("Ctrl-C received, shutting down");
            None
        }
        result = &mut runtime_task => {
            warn!("Lock runtime stopped on its own");
            Some(result)
        }
    };
    let runtime_result = match finished {
        Some(result) => result,
        None => {
            let _ = runtime_stop.send(());
            runtime_task.await
        }
    };

    if let Some(server) = admin {
        server.shutdown().await?;
    }
    if let Some(db) = access_log {
        db.close().await;
    }

    runtime_result
        .context("lock runtime panicked")?
        .context("lock runtime failed")
}
