//! Wires storage, scrapers and the status logger together and owns their
//! lifetime.

use crate::config::AgentSettings;
use crate::scrape::{ScrapeReport, Scraper};
use crate::storage::sqlite::{SqliteSettings, SqliteStorage};
use crate::storage::{Clock, StorageEngine, StorageHandle, StorageInstance, SystemClock};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct Agent {
    storage: StorageHandle,
    shutdown: CancellationToken,
    storage_shutdown: CancellationToken,
    scrapers: Vec<JoinHandle<()>>,
    storage_task: JoinHandle<()>,
    status_task: JoinHandle<()>,
}

impl Agent {
    /// Opens the database file and starts every task.
    pub async fn start(settings: &AgentSettings) -> Result<Self> {
        let sqlite_settings = SqliteSettings {
            busy_timeout: settings.sqlite_busy_timeout,
            id_cache_size: settings.id_cache_size,
        };

        info!(path = %settings.sqlite_file.display(), "Opening storage");
        let mut storage = SqliteStorage::open(&settings.sqlite_file, sqlite_settings)
            .await
            .with_context(|| format!("Failed to open {}", settings.sqlite_file.display()))?;
        storage
            .create_or_migrate()
            .await
            .context("Failed to create or migrate database schema")?;

        Self::start_with(Box::new(storage), Arc::new(SystemClock), settings)
    }

    /// Starts every task on top of an already migrated storage.
    pub fn start_with(
        storage: Box<dyn StorageInstance>,
        clock: Arc<dyn Clock>,
        settings: &AgentSettings,
    ) -> Result<Self> {
        let scrapers = settings
            .scrape_urls
            .iter()
            .map(|url| Scraper::new(url.clone(), settings.scrape_interval))
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build the HTTP client")?;

        let shutdown = CancellationToken::new();
        // Stopped after the scrapers, so their last cycle is still stored
        let storage_shutdown = CancellationToken::new();

        let (engine, handle) = StorageEngine::new(
            storage,
            clock,
            settings.sample_channel_capacity,
            settings.query_channel_capacity,
            storage_shutdown.clone(),
        );
        let storage_task = tokio::spawn(engine.run());

        let (status, reports) = mpsc::channel(settings.status_channel_capacity.max(1));
        let status_task = tokio::spawn(log_reports(reports));

        let scrapers = scrapers
            .into_iter()
            .map(|scraper| {
                debug!(url = %scraper.target(), "Spawning scraper");
                tokio::spawn(scraper.run(handle.samples(), status.clone(), shutdown.clone()))
            })
            .collect::<Vec<_>>();

        info!(targets = scrapers.len(), interval = ?settings.scrape_interval, "Agent started");

        Ok(Self {
            storage: handle,
            shutdown,
            storage_shutdown,
            scrapers,
            storage_task,
            status_task,
        })
    }

    pub fn storage(&self) -> StorageHandle {
        self.storage.clone()
    }

    /// Cancelled when the agent starts shutting down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops the scrapers, then the storage, and waits for every task.
    pub async fn shutdown(self) {
        info!("Shutting down");
        self.shutdown.cancel();
        log_join_errors("scraper", join_all(self.scrapers).await);

        self.storage_shutdown.cancel();
        log_join_errors("storage", vec![self.storage_task.await]);
        log_join_errors("status", vec![self.status_task.await]);
        info!("Agent stopped");
    }
}

async fn log_reports(mut reports: mpsc::Receiver<ScrapeReport>) {
    while let Some(report) = reports.recv().await {
        report.log();
    }
}

fn log_join_errors(task: &str, results: Vec<Result<(), tokio::task::JoinError>>) {
    for result in results {
        if let Err(e) = result {
            error!(task, error = %e, "Task failed");
        }
    }
}
