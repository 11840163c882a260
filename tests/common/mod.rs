use anyhow::Result;
use scrapeagent::storage::{StorageEngine, StorageHandle};
use scrapeagent::test_utils::{ManualClock, memory_storage};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running storage engine over an in-memory database.
pub struct TestStorage {
    pub handle: StorageHandle,
    pub clock: Arc<ManualClock>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl TestStorage {
    pub async fn start(now: i64) -> Result<Self> {
        let clock = Arc::new(ManualClock::new(now));
        let shutdown = CancellationToken::new();
        let (engine, handle) = StorageEngine::new(
            Box::new(memory_storage().await?),
            clock.clone(),
            512,
            16,
            shutdown.clone(),
        );
        let task = tokio::spawn(engine.run());

        Ok(Self {
            handle,
            clock,
            shutdown,
            task,
        })
    }

    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        self.task.await?;
        Ok(())
    }
}
