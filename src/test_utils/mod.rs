//! Helpers shared by unit and integration tests.

mod db;
mod fixtures;
mod http;

pub use db::{ManualClock, file_storage, memory_storage};
pub use fixtures::{MEMORY_USAGE_PAYLOAD, MIXED_PAYLOAD};
pub use http::MetricsServer;
