//! Persistence for the smart lock.
//!
//! Two stores with very different jobs:
//!
//! - [`LockStore`] keeps the lock's own state (admin password, PIN, feature
//!   switches, master card, lockout time and the user card table) in a
//!   512-byte [`Eeprom`] image, either in memory or file-backed.
//! - The access log is an SQLite audit trail of every credential presented,
//!   reached through the [`AccessLogRepository`] trait.
//!
//! # Examples
//!
//! ```
//! use smartlock_core::{CardUid, PinCode};
//! use smartlock_storage::{CardToggle, LockStore, MemoryEeprom};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = LockStore::open(MemoryEeprom::new())?;
//! assert!(store.is_first_run()?);
//!
//! store.complete_first_run(CardUid::new([9, 9, 9, 9]), &PinCode::new("1234")?)?;
//! let card = CardUid::new([172, 61, 255, 160]);
//! assert_eq!(store.toggle_card(card)?, CardToggle::Added);
//! assert!(store.contains_card(&card)?);
//! # Ok(())
//! # }
//! ```
//!
//! ```no_run
//! use smartlock_storage::{AccessLogRepository, Database, DatabaseConfig, SqliteAccessLogRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("access.db")).await?;
//! let logs = SqliteAccessLogRepository::new(db.pool().clone());
//!
//! for entry in logs.find_recent_denied(20).await? {
//!     println!("{} {:?}", entry.timestamp, entry.credential);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod eeprom;
pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use eeprom::{Eeprom, FileEeprom, MemoryEeprom};
pub use error::{StorageError, StorageResult};
pub use models::AccessLog;
pub use repositories::{AccessLogRepository, SqliteAccessLogRepository};
pub use store::{CardToggle, LockSettings, LockStore};
