//! The storage task.
//!
//! One `StorageEngine` owns the storage instance and services sample writes
//! and query requests one at a time. Every other component talks to it
//! through a cloneable [`StorageHandle`]. With a single writer there is no
//! locking around the write and query paths.

use super::clock::Clock;
use super::error::StorageError;
use super::storage::{StorageInstance, StorageStats, WriteOutcome};
use crate::datamodel::{AggregatedTimeseries, Sample};
use crate::query::Expr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

pub enum StorageRequest {
    Query {
        expr: Expr,
        reply: oneshot::Sender<Result<Vec<AggregatedTimeseries>, StorageError>>,
    },
    Stats {
        reply: oneshot::Sender<Result<StorageStats, StorageError>>,
    },
}

#[derive(Debug, Clone)]
pub struct StorageHandle {
    samples: mpsc::Sender<Sample>,
    requests: mpsc::Sender<StorageRequest>,
}

impl StorageHandle {
    /// Sender for the shared, bounded sample channel. Sending waits while
    /// the channel is full.
    pub fn samples(&self) -> mpsc::Sender<Sample> {
        self.samples.clone()
    }

    pub async fn submit(&self, sample: Sample) -> Result<(), StorageError> {
        self.samples
            .send(sample)
            .await
            .map_err(|_| StorageError::Closed)
    }

    /// Evaluates a query. It observes every sample submitted before it.
    pub async fn query(&self, expr: Expr) -> Result<Vec<AggregatedTimeseries>, StorageError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(StorageRequest::Query { expr, reply })
            .await
            .map_err(|_| StorageError::Closed)?;
        response.await.map_err(|_| StorageError::Closed)?
    }

    pub async fn stats(&self) -> Result<StorageStats, StorageError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(StorageRequest::Stats { reply })
            .await
            .map_err(|_| StorageError::Closed)?;
        response.await.map_err(|_| StorageError::Closed)?
    }
}

pub struct StorageEngine {
    storage: Box<dyn StorageInstance>,
    clock: Arc<dyn Clock>,
    samples: mpsc::Receiver<Sample>,
    requests: mpsc::Receiver<StorageRequest>,
    shutdown: CancellationToken,
}

impl StorageEngine {
    pub fn new(
        storage: Box<dyn StorageInstance>,
        clock: Arc<dyn Clock>,
        sample_capacity: usize,
        request_capacity: usize,
        shutdown: CancellationToken,
    ) -> (Self, StorageHandle) {
        let (samples_sender, samples) = mpsc::channel(sample_capacity.max(1));
        let (requests_sender, requests) = mpsc::channel(request_capacity.max(1));

        let engine = Self {
            storage,
            clock,
            samples,
            requests,
            shutdown,
        };
        let handle = StorageHandle {
            samples: samples_sender,
            requests: requests_sender,
        };
        (engine, handle)
    }

    /// Runs until the shutdown token is cancelled or every handle is gone.
    ///
    /// Samples take precedence over requests, so a query sees the samples
    /// queued ahead of it. On shutdown the samples already queued are
    /// written before the database is closed; pending requests are dropped.
    pub async fn run(mut self) {
        let mut samples_open = true;
        let mut requests_open = true;

        while samples_open || requests_open {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("Storage engine received shutdown signal");
                    self.drain().await;
                    break;
                }
                sample = self.samples.recv(), if samples_open => match sample {
                    Some(sample) => self.write(sample).await,
                    None => samples_open = false,
                },
                request = self.requests.recv(), if requests_open => match request {
                    Some(request) => self.serve(request).await,
                    None => requests_open = false,
                },
            }
        }

        self.storage.close().await;
        info!("Storage engine stopped");
    }

    async fn drain(&mut self) {
        self.samples.close();
        self.requests.close();

        let mut drained = 0usize;
        while let Some(sample) = self.samples.recv().await {
            self.write(sample).await;
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "Wrote queued samples before stopping");
        }
    }

    async fn write(&mut self, sample: Sample) {
        let timestamp = match self.clock.now_seconds() {
            Ok(timestamp) => timestamp,
            Err(e) => {
                error!(error = %e, "Dropping sample, no timestamp available");
                return;
            }
        };

        match self.storage.insert_sample(&sample, timestamp).await {
            Ok(WriteOutcome::Inserted) => {
                trace!(metric = sample.name().unwrap_or_default(), timestamp, "Sample stored");
            }
            Ok(WriteOutcome::Duplicate) => {
                trace!(
                    metric = sample.name().unwrap_or_default(),
                    timestamp,
                    "Sample dropped, series already has a sample at this second"
                );
            }
            Err(e) => {
                error!(
                    metric = sample.name().unwrap_or_default(),
                    error = %e,
                    "Failed to store sample"
                );
            }
        }
    }

    async fn serve(&mut self, request: StorageRequest) {
        match request {
            StorageRequest::Query { expr, reply } => {
                let result = match self.clock.now_seconds() {
                    Ok(now) => self.storage.evaluate(&expr, now).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = &result {
                    error!(error = %e, "Query failed");
                }
                // The caller may have given up waiting
                let _ = reply.send(result);
            }
            StorageRequest::Stats { reply } => {
                let _ = reply.send(self.storage.stats().await);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Selector;
    use crate::storage::sqlite::SqliteStorage;
    use crate::test_utils::{ManualClock, file_storage};
    use async_trait::async_trait;

    async fn engine_with_clock(
        clock: Arc<ManualClock>,
    ) -> (tokio::task::JoinHandle<()>, StorageHandle, CancellationToken) {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        storage.create_or_migrate().await.unwrap();
        let shutdown = CancellationToken::new();
        let (engine, handle) =
            StorageEngine::new(Box::new(storage), clock, 512, 16, shutdown.clone());
        (tokio::spawn(engine.run()), handle, shutdown)
    }

    #[tokio::test]
    async fn test_query_sees_prior_samples() {
        let clock = Arc::new(ManualClock::new(1000));
        let (task, handle, shutdown) = engine_with_clock(clock).await;

        handle
            .submit(Sample::new("up", 1.0).with_label("pod", "a"))
            .await
            .unwrap();
        handle
            .submit(Sample::new("up", 0.0).with_label("pod", "b"))
            .await
            .unwrap();

        let result = handle
            .query(Selector::instant("up").into())
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].value(), Some(1.0));
        assert_eq!(result[1].value(), Some(0.0));

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_same_second_writes_are_dropped() {
        let clock = Arc::new(ManualClock::new(1000));
        let (task, handle, shutdown) = engine_with_clock(clock.clone()).await;

        handle.submit(Sample::new("up", 1.0)).await.unwrap();
        handle.submit(Sample::new("up", 2.0)).await.unwrap();
        // Round trip so both writes happen before the clock moves
        handle.stats().await.unwrap();
        clock.advance(1);
        handle.submit(Sample::new("up", 3.0)).await.unwrap();

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.timeseries, 1);
        assert_eq!(stats.samples, 2);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_samples() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("metrics.db");

        let storage = file_storage(&path).await.unwrap();
        let shutdown = CancellationToken::new();
        let (engine, handle) = StorageEngine::new(
            Box::new(storage),
            Arc::new(ManualClock::new(1000)),
            16,
            4,
            shutdown.clone(),
        );

        // Queue before the engine runs, then stop it right away
        for pod in ["a", "b", "c"] {
            handle
                .submit(Sample::new("up", 1.0).with_label("pod", pod))
                .await
                .unwrap();
        }
        shutdown.cancel();
        engine.run().await;

        // Handle is now disconnected
        assert!(matches!(
            handle.submit(Sample::new("up", 1.0)).await,
            Err(StorageError::Closed)
        ));
        assert!(matches!(handle.stats().await, Err(StorageError::Closed)));

        let mut storage = file_storage(&path).await.unwrap();
        assert_eq!(storage.stats().await.unwrap().samples, 3);
    }

    #[tokio::test]
    async fn test_stops_when_handles_dropped() {
        let clock = Arc::new(ManualClock::new(1000));
        let (task, handle, _shutdown) = engine_with_clock(clock).await;
        drop(handle);
        task.await.unwrap();
    }

    #[derive(Debug, Default)]
    struct FailingStorage {
        attempts: usize,
    }

    #[async_trait]
    impl StorageInstance for FailingStorage {
        async fn create_or_migrate(&mut self) -> Result<(), StorageError> {
            Ok(())
        }

        async fn insert_sample(
            &mut self,
            _sample: &Sample,
            _timestamp: i64,
        ) -> Result<WriteOutcome, StorageError> {
            self.attempts += 1;
            Err(StorageError::Database(sqlx::Error::RowNotFound))
        }

        async fn evaluate(
            &mut self,
            _expr: &Expr,
            _now: i64,
        ) -> Result<Vec<AggregatedTimeseries>, StorageError> {
            Err(StorageError::Database(sqlx::Error::RowNotFound))
        }

        async fn stats(&mut self) -> Result<StorageStats, StorageError> {
            Ok(StorageStats {
                samples: self.attempts as i64,
                ..Default::default()
            })
        }

        async fn close(&mut self) {}
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let shutdown = CancellationToken::new();
        let (engine, handle) = StorageEngine::new(
            Box::new(FailingStorage::default()),
            Arc::new(ManualClock::new(1000)),
            8,
            4,
            shutdown.clone(),
        );
        let task = tokio::spawn(engine.run());

        handle.submit(Sample::new("up", 1.0)).await.unwrap();
        handle.submit(Sample::new("up", 2.0)).await.unwrap();

        // A failed query returns an error, nothing partial
        assert!(matches!(
            handle.query(Selector::instant("up").into()).await,
            Err(StorageError::Database(_))
        ));

        // The loop is still serving and saw both write attempts
        assert_eq!(handle.stats().await.unwrap().samples, 2);

        shutdown.cancel();
        task.await.unwrap();
    }
}
