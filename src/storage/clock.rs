use super::error::StorageError;
use std::fmt::Debug;

/// Source of the wall-clock second stamped on every stored sample.
pub trait Clock: Send + Sync + Debug {
    fn now_seconds(&self) -> Result<i64, StorageError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> Result<i64, StorageError> {
        let now = hifitime::Epoch::now().map_err(|e| StorageError::Clock(e.to_string()))?;
        Ok(now.to_unix_seconds().floor() as i64)
    }
}
