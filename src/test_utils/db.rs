use crate::storage::sqlite::{SqliteSettings, SqliteStorage};
use crate::storage::{Clock, StorageError, StorageInstance};
use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    pub fn new(seconds: i64) -> Self {
        Self {
            seconds: AtomicI64::new(seconds),
        }
    }

    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_seconds(&self) -> Result<i64, StorageError> {
        Ok(self.seconds.load(Ordering::SeqCst))
    }
}

/// Migrated in-memory database.
pub async fn memory_storage() -> Result<SqliteStorage> {
    let mut storage = SqliteStorage::in_memory().await?;
    storage.create_or_migrate().await?;
    Ok(storage)
}

/// Migrated database file at `path`, created if missing.
pub async fn file_storage(path: &Path) -> Result<SqliteStorage> {
    let mut storage = SqliteStorage::open(path, SqliteSettings::default()).await?;
    storage.create_or_migrate().await?;
    Ok(storage)
}
