use thiserror::Error;

/// Storage-specific error types for the smart lock.
///
/// Covers the persistent memory image as well as the SQLite access log.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Reading or writing the memory image file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Access outside the memory image
    #[error("Memory access out of range: {len} bytes at offset {offset} (size {size})")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    /// No free slot left in the user card table
    #[error("Card table full ({capacity} cards)")]
    CardTableFull { capacity: usize },

    /// Entity not found
    #[error("Entity not found: {entity_type} with {field}={value}")]
    NotFound {
        entity_type: String,
        field: String,
        value: String,
    },

    /// Data validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<smartlock_core::Error> for StorageError {
    fn from(error: smartlock_core::Error) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
