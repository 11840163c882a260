use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Success { samples: usize },
    Failed { message: String },
}

/// Outcome of one scrape cycle, sent to the status sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeReport {
    pub target: Url,
    pub elapsed: Duration,
    pub outcome: ScrapeOutcome,
}

impl ScrapeReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ScrapeOutcome::Success { .. })
    }

    /// Logs the report, successes at info and failures at warn.
    pub fn log(&self) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        match &self.outcome {
            ScrapeOutcome::Success { samples } => tracing::info!(
                url = %self.target,
                elapsed_ms,
                samples,
                "Scrape finished"
            ),
            ScrapeOutcome::Failed { message } => tracing::warn!(
                url = %self.target,
                elapsed_ms,
                error = %message,
                "Scrape failed"
            ),
        }
    }
}
