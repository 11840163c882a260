use super::error::ScrapeError;
use super::report::{ScrapeOutcome, ScrapeReport};
use crate::datamodel::Sample;
use crate::parsing::parse_exposition;
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Polls one target.
///
/// The request timeout equals the scrape interval, and the scraper sleeps
/// for the interval after each cycle, so the actual period is the interval
/// plus the time the cycle took.
#[derive(Debug, Clone)]
pub struct Scraper {
    target: Url,
    interval: Duration,
    client: reqwest::Client,
}

impl Scraper {
    pub fn new(target: Url, interval: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().timeout(interval).build()?;
        Ok(Self {
            target,
            interval,
            client,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    async fn fetch(&self) -> Result<String, ScrapeError> {
        let response = self.client.get(self.target.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScrapeError::UnexpectedStatus(status));
        }

        Ok(response.text().await?)
    }

    /// Runs one cycle and forwards the parsed samples.
    ///
    /// The payload is parsed completely before anything is sent, so a bad
    /// payload forwards nothing. Sending waits while the sample channel is
    /// full.
    pub async fn scrape_once(&self, samples: &mpsc::Sender<Sample>) -> Result<usize, ScrapeError> {
        let body = self.fetch().await?;
        let parsed = parse_exposition(&body)?;

        let count = parsed.len();
        for sample in parsed {
            samples
                .send(sample)
                .await
                .map_err(|_| ScrapeError::StorageClosed)?;
        }

        Ok(count)
    }

    /// Scrapes until `shutdown` is cancelled. A cycle already in flight is
    /// finished first.
    pub async fn run(
        self,
        samples: mpsc::Sender<Sample>,
        status: mpsc::Sender<ScrapeReport>,
        shutdown: CancellationToken,
    ) {
        info!(url = %self.target, interval = ?self.interval, "Starting scraper");

        while !shutdown.is_cancelled() {
            let start = Instant::now();
            let result = self.scrape_once(&samples).await;
            let elapsed = start.elapsed();

            let storage_closed = matches!(result, Err(ScrapeError::StorageClosed));
            let outcome = match result {
                Ok(samples) => ScrapeOutcome::Success { samples },
                Err(e) => ScrapeOutcome::Failed {
                    message: e.to_string(),
                },
            };

            let report = ScrapeReport {
                target: self.target.clone(),
                elapsed,
                outcome,
            };
            if status.send(report).await.is_err() {
                debug!(url = %self.target, "Status sink is gone");
            }

            if storage_closed {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        info!(url = %self.target, "Scraper stopped");
    }
}
