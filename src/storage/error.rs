use thiserror::Error;

/// Storage-specific errors that can occur during database operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or statement execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema creation failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The wall clock could not be read
    #[error("Clock error: {0}")]
    Clock(String),

    /// The storage engine task is gone, or stopped before answering
    #[error("Storage engine is not running")]
    Closed,
}
