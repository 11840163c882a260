use super::error::StorageError;
use crate::datamodel::{AggregatedTimeseries, Sample};
use crate::query::Expr;
use async_trait::async_trait;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new sample row was stored.
    Inserted,
    /// The series already had a sample at this second; the value was dropped.
    Duplicate,
}

/// Row counts of the four tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub timeseries: i64,
    pub labels: i64,
    pub samples: i64,
    pub timeseries_labels: i64,
}

/// A storage backend. Methods take `&mut self`: an instance is owned by the
/// storage engine task and is never shared.
#[async_trait]
pub trait StorageInstance: Send + Debug {
    async fn create_or_migrate(&mut self) -> Result<(), StorageError>;

    async fn insert_sample(
        &mut self,
        sample: &Sample,
        timestamp: i64,
    ) -> Result<WriteOutcome, StorageError>;

    /// Evaluates a query against the stored data. `now` is the wall-clock
    /// second used to resolve lookback windows.
    async fn evaluate(
        &mut self,
        expr: &Expr,
        now: i64,
    ) -> Result<Vec<AggregatedTimeseries>, StorageError>;

    async fn stats(&mut self) -> Result<StorageStats, StorageError>;

    async fn close(&mut self);
}
