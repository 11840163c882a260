pub mod clock;
pub mod engine;
pub mod error;
pub mod hash;
pub mod sqlite;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use engine::{StorageEngine, StorageHandle, StorageRequest};
pub use error::StorageError;
pub use hash::timeseries_hash;
pub use storage::{StorageInstance, StorageStats, WriteOutcome};
